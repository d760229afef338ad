//! Correlation identifiers.
//!
//! Every [`AppError`](crate::AppError) carries an opaque id that lets a user
//! quote "what went wrong" to support and lets the collection endpoint join
//! a report with the matching server-side logs.
//!
//! # Generators
//!
//! - [`UuidV4Generator`]: random UUIDv4, the default everywhere
//! - [`TimestampIdGenerator`]: `fallback-<epoch millis>`, strictly increasing
//!   per generator, for deterministic contexts and environments without a
//!   usable entropy source
//!
//! Consumers must treat ids as opaque. Their shape carries no meaning.
//!
//! # Example
//!
//! ```rust
//! use app_errors::correlation::{IdGenerator, TimestampIdGenerator};
//!
//! let ids = TimestampIdGenerator::new();
//! let a = ids.next_id();
//! let b = ids.next_id();
//! assert!(a.starts_with("fallback-"));
//! assert_ne!(a, b);
//! ```

use std::fmt::Debug;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::sync::OnceLock;
use uuid::Uuid;

/// Prefix carried by ids from [`TimestampIdGenerator`].
pub const FALLBACK_PREFIX: &str = "fallback-";

/// Source of correlation ids.
///
/// Implementations must never hand out the same id twice for the lifetime of
/// the generator.
pub trait IdGenerator: Send + Sync + Debug {
    fn next_id(&self) -> String;
}

// ============================================================================
// UUIDv4
// ============================================================================

/// Random UUIDv4 ids (`xxxxxxxx-xxxx-4xxx-yxxx-xxxxxxxxxxxx`).
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidV4Generator;

impl IdGenerator for UuidV4Generator {
    #[inline]
    fn next_id(&self) -> String {
        Uuid::new_v4().to_string()
    }
}

// ============================================================================
// Timestamp
// ============================================================================

/// Millisecond timestamp ids.
///
/// Two calls in the same millisecond would collide, so the generator keeps
/// the last value it issued and bumps past it. Ids are therefore strictly
/// increasing and may run ahead of the wall clock under bursts.
#[derive(Debug, Default)]
pub struct TimestampIdGenerator {
    last: AtomicU64,
}

impl TimestampIdGenerator {
    pub const fn new() -> Self {
        Self {
            last: AtomicU64::new(0),
        }
    }

    fn next_millis(&self) -> u64 {
        let now = now_millis();
        let mut prev = self.last.load(Ordering::Relaxed);
        loop {
            let next = now.max(prev.wrapping_add(1));
            match self
                .last
                .compare_exchange_weak(prev, next, Ordering::AcqRel, Ordering::Relaxed)
            {
                Ok(_) => return next,
                Err(actual) => prev = actual,
            }
        }
    }
}

impl IdGenerator for TimestampIdGenerator {
    fn next_id(&self) -> String {
        format!("{FALLBACK_PREFIX}{}", self.next_millis())
    }
}

#[inline]
fn now_millis() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map_or(0_u64, |d| d.as_millis() as u64)
}

// ============================================================================
// Process Default
// ============================================================================

/// Shared default generator (UUIDv4).
pub fn default_generator() -> Arc<dyn IdGenerator> {
    static DEFAULT: OnceLock<Arc<dyn IdGenerator>> = OnceLock::new();
    DEFAULT.get_or_init(|| Arc::new(UuidV4Generator)).clone()
}

/// Generate one id with the default generator.
#[inline]
pub fn generate_correlation_id() -> String {
    default_generator().next_id()
}
