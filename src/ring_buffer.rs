//! Bounded ledger of recent report deliveries.
//!
//! Reporting is fire-and-forget, so nothing ever tells the caller whether a
//! report arrived. The ledger keeps the last N outcomes in memory so a
//! debug panel or a test can ask "what happened to correlation id X?".
//!
//! # Design Principles
//!
//! - **Bounded memory**: fixed capacity, FIFO eviction
//! - **Per-entry size caps**: correlation ids are truncated to 128 bytes
//! - **RwLock-based**: concurrent readers, exclusive writers
//! - **Poison-tolerant**: a panicked writer never disables the ledger
//!
//! # Example
//!
//! ```rust
//! use app_errors::{convenience, DeliveryLedger, DeliveryOutcome};
//!
//! let ledger = DeliveryLedger::new(100);
//! let err = convenience::network_error();
//! ledger.record(&err, DeliveryOutcome::Beacon, 312);
//!
//! let last = &ledger.recent(1)[0];
//! assert_eq!(last.outcome, DeliveryOutcome::Beacon);
//! assert_eq!(last.correlation_id.as_ref(), err.correlation_id());
//! ```

use crate::{AppError, ErrorCode};
use chrono::{DateTime, Utc};
use std::borrow::Cow;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Cap on the stored correlation id length.
const MAX_ID_BYTES: usize = 128;

/// How a single report ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeliveryOutcome {
    /// The payload could not be encoded; nothing was sent.
    EncodeFailed,
    /// The primary channel accepted the payload.
    Beacon,
    /// The primary channel declined or failed; the fallback request succeeded.
    Fetch,
    /// Both channels failed (or the fallback could not run).
    Failed,
}

impl DeliveryOutcome {
    const ALL: [DeliveryOutcome; 4] = [Self::EncodeFailed, Self::Beacon, Self::Fetch, Self::Failed];

    #[inline]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::EncodeFailed => "encode_failed",
            Self::Beacon => "beacon",
            Self::Fetch => "fetch",
            Self::Failed => "failed",
        }
    }

    /// Whether the payload left the process on some channel.
    #[inline]
    pub const fn is_delivered(self) -> bool {
        matches!(self, Self::Beacon | Self::Fetch)
    }

    #[inline]
    const fn index(self) -> usize {
        match self {
            Self::EncodeFailed => 0,
            Self::Beacon => 1,
            Self::Fetch => 2,
            Self::Failed => 3,
        }
    }
}

impl fmt::Display for DeliveryOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One ledger entry. Cheap to clone.
#[derive(Clone, Debug)]
pub struct DeliveryRecord {
    pub recorded_at: DateTime<Utc>,
    pub code: ErrorCode,
    pub correlation_id: Arc<str>,
    pub outcome: DeliveryOutcome,
    /// Encoded payload size, 0 when encoding failed.
    pub body_bytes: usize,
}

/// Fixed-size ring buffer with exact allocation (no growth).
struct RingBuffer {
    entries: Box<[Option<DeliveryRecord>]>,
    tail: usize,
    head: usize,
    len: usize,
}

impl RingBuffer {
    fn new(capacity: usize) -> Self {
        Self {
            entries: std::iter::repeat_with(|| None)
                .take(capacity)
                .collect::<Box<[Option<DeliveryRecord>]>>(),
            tail: 0,
            head: 0,
            len: 0,
        }
    }

    fn push(&mut self, entry: DeliveryRecord) -> Option<DeliveryRecord> {
        let evicted = self.entries[self.tail].replace(entry);
        self.tail = (self.tail + 1) % self.entries.len();

        if self.len < self.entries.len() {
            self.len += 1;
        } else {
            self.head = (self.head + 1) % self.entries.len();
        }

        evicted
    }

    #[inline]
    fn len(&self) -> usize {
        self.len
    }

    fn iter(&self) -> impl DoubleEndedIterator<Item = &DeliveryRecord> {
        let head = self.head;
        let cap = self.entries.len();

        (0..self.len).filter_map(move |i| self.entries[(head + i) % cap].as_ref())
    }

    fn clear(&mut self) {
        for entry in self.entries.iter_mut() {
            *entry = None;
        }
        self.head = 0;
        self.tail = 0;
        self.len = 0;
    }
}

/// Bounded, shareable record of report outcomes.
///
/// Clones share the same buffer and counters.
#[derive(Clone)]
pub struct DeliveryLedger {
    buffer: Arc<RwLock<RingBuffer>>,
    capacity: usize,
    evictions: Arc<AtomicU64>,
    totals: Arc<[AtomicU64; 4]>,
}

impl DeliveryLedger {
    /// Default capacity used by [`ErrorReporter`](crate::ErrorReporter).
    pub const DEFAULT_CAPACITY: usize = 256;

    /// A zero capacity is bumped to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            buffer: Arc::new(RwLock::new(RingBuffer::new(capacity))),
            capacity,
            evictions: Arc::new(AtomicU64::new(0)),
            totals: Arc::new(std::array::from_fn(|_| AtomicU64::new(0))),
        }
    }

    #[inline]
    fn read_buffer(&self) -> RwLockReadGuard<'_, RingBuffer> {
        match self.buffer.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    #[inline]
    fn write_buffer(&self) -> RwLockWriteGuard<'_, RingBuffer> {
        match self.buffer.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Record the outcome of one report.
    pub fn record(&self, err: &AppError, outcome: DeliveryOutcome, body_bytes: usize) {
        let entry = DeliveryRecord {
            recorded_at: Utc::now(),
            code: err.code(),
            correlation_id: Arc::from(truncate_to_bytes(err.correlation_id(), MAX_ID_BYTES).as_ref()),
            outcome,
            body_bytes,
        };

        self.totals[outcome.index()].fetch_add(1, Ordering::Relaxed);

        let mut buffer = self.write_buffer();
        if buffer.push(entry).is_some() {
            self.evictions.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// The `count` most recent records, newest first.
    pub fn recent(&self, count: usize) -> Vec<DeliveryRecord> {
        self.read_buffer().iter().rev().take(count).cloned().collect()
    }

    /// All retained records, newest first.
    pub fn all(&self) -> Vec<DeliveryRecord> {
        self.read_buffer().iter().rev().cloned().collect()
    }

    pub fn filtered<F>(&self, predicate: F) -> Vec<DeliveryRecord>
    where
        F: Fn(&DeliveryRecord) -> bool,
    {
        self.read_buffer()
            .iter()
            .rev()
            .filter(|r| predicate(r))
            .cloned()
            .collect()
    }

    /// Latest record for a correlation id.
    pub fn find(&self, correlation_id: &str) -> Option<DeliveryRecord> {
        self.read_buffer()
            .iter()
            .rev()
            .find(|r| r.correlation_id.as_ref() == correlation_id)
            .cloned()
    }

    /// Lifetime count for one outcome, including evicted records.
    #[inline]
    pub fn total(&self, outcome: DeliveryOutcome) -> u64 {
        self.totals[outcome.index()].load(Ordering::Relaxed)
    }

    /// Lifetime counts for every outcome.
    pub fn totals(&self) -> [(DeliveryOutcome, u64); 4] {
        DeliveryOutcome::ALL.map(|o| (o, self.total(o)))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.read_buffer().len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    pub fn eviction_count(&self) -> u64 {
        self.evictions.load(Ordering::Relaxed)
    }

    /// Drop retained records. Lifetime totals are kept.
    pub fn clear(&self) {
        self.write_buffer().clear();
    }
}

impl Default for DeliveryLedger {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}

impl fmt::Debug for DeliveryLedger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeliveryLedger")
            .field("len", &self.len())
            .field("capacity", &self.capacity)
            .field("evictions", &self.eviction_count())
            .finish()
    }
}

/// Truncate string to maximum byte length, respecting UTF-8 boundaries.
fn truncate_to_bytes(s: &str, max_bytes: usize) -> Cow<'_, str> {
    if s.len() <= max_bytes {
        return Cow::Borrowed(s);
    }

    let indicator = "...[TRUNC]";
    if max_bytes <= indicator.len() {
        return Cow::Borrowed(&indicator[..max_bytes]);
    }

    let mut idx = max_bytes - indicator.len();
    while idx > 0 && !s.is_char_boundary(idx) {
        idx -= 1;
    }

    let mut out = String::with_capacity(idx + indicator.len());
    out.push_str(&s[..idx]);
    out.push_str(indicator);
    Cow::Owned(out)
}
