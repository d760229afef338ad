//! Delivery channels for error reports.
//!
//! Two seams, mirroring how a page ships telemetry while it may be going
//! away:
//!
//! - [`Beacon`]: synchronous, fire-and-forget hand-off. Returns whether the
//!   payload was *accepted for delivery*, never whether it arrived.
//! - [`Fetch`]: one async `POST` with a JSON body and a keep-alive flag.
//!
//! Production implementations are [`QueueBeacon`] (bounded queue drained by
//! a background [`BeaconWorker`]) and [`HttpFetch`] (`reqwest`). Tests swap
//! in their own.

use async_trait::async_trait;
use futures::FutureExt;
use reqwest::header::{CONNECTION, CONTENT_TYPE};
use reqwest::{Client, Method};
use std::fmt::Debug;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use zeroize::Zeroizing;

/// Content type of every report body.
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Method of every fallback request.
pub const REPORT_METHOD: Method = Method::POST;

/// Largest queue a [`QueueBeacon`] will allocate.
pub const MAX_BEACON_CAPACITY: usize = 65_536;

/// Transport-level failures. The reporter swallows all of them.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("transport unavailable: {0}")]
    Unavailable(&'static str),

    #[error("beacon queue closed")]
    Closed,

    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("collection endpoint answered {0}")]
    Status(u16),
}

// ============================================================================
// Seams
// ============================================================================

/// Primary, non-blocking delivery channel.
pub trait Beacon: Send + Sync + Debug {
    /// `Ok(true)` when the payload was queued for delivery, `Ok(false)` when
    /// the channel declined it (full, over quota).
    fn send_beacon(&self, endpoint: &str, body: &[u8]) -> Result<bool, TransportError>;
}

/// One fallback request. Method and content type are fixed
/// ([`REPORT_METHOD`], [`JSON_CONTENT_TYPE`]).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub endpoint: String,
    pub body: Zeroizing<Vec<u8>>,
    /// Ask the transport to let the request outlive its initiator.
    pub keepalive: bool,
}

/// Fallback, async delivery channel.
#[async_trait]
pub trait Fetch: Send + Sync + Debug {
    async fn post(&self, request: FetchRequest) -> Result<(), TransportError>;
}

// ============================================================================
// HTTP Fetch
// ============================================================================

/// [`Fetch`] over a shared `reqwest::Client`.
///
/// Relative endpoints (`/api/report-error`) are joined onto `base_url`;
/// absolute `http(s)://` endpoints are used as-is.
#[derive(Debug, Clone)]
pub struct HttpFetch {
    client: Client,
    base_url: String,
}

impl HttpFetch {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    /// Build a dedicated client with a request timeout.
    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Result<Self, TransportError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self::new(client, base_url))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn url_for(&self, endpoint: &str) -> String {
        if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
            return endpoint.to_string();
        }
        let base = self.base_url.trim_end_matches('/');
        if endpoint.starts_with('/') {
            format!("{base}{endpoint}")
        } else {
            format!("{base}/{endpoint}")
        }
    }
}

#[async_trait]
impl Fetch for HttpFetch {
    async fn post(&self, request: FetchRequest) -> Result<(), TransportError> {
        let url = self.url_for(&request.endpoint);
        let connection = if request.keepalive { "keep-alive" } else { "close" };

        let resp = self
            .client
            .request(REPORT_METHOD, &url)
            .header(CONTENT_TYPE, JSON_CONTENT_TYPE)
            .header(CONNECTION, connection)
            .body(request.body.to_vec())
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(TransportError::Status(status.as_u16()));
        }
        Ok(())
    }
}

// ============================================================================
// Queue Beacon
// ============================================================================

struct BeaconItem {
    endpoint: String,
    body: Zeroizing<Vec<u8>>,
}

/// [`Beacon`] backed by a bounded queue.
///
/// `send_beacon` never blocks: a full queue declines the payload and the
/// reporter falls back to its [`Fetch`]. A single [`BeaconWorker`] drains
/// the queue through the wrapped fetch transport.
#[derive(Debug, Clone)]
pub struct QueueBeacon {
    tx: mpsc::Sender<BeaconItem>,
}

impl Debug for BeaconItem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BeaconItem")
            .field("endpoint", &self.endpoint)
            .field("body_len", &self.body.len())
            .finish()
    }
}

impl QueueBeacon {
    /// Start the queue and its worker on the current tokio runtime.
    ///
    /// `capacity` is clamped to `1..=MAX_BEACON_CAPACITY`. Fails with
    /// [`TransportError::Unavailable`] outside a runtime.
    pub fn spawn(
        capacity: usize,
        fetch: Arc<dyn Fetch>,
    ) -> Result<(Self, BeaconWorker), TransportError> {
        let handle = tokio::runtime::Handle::try_current()
            .map_err(|_| TransportError::Unavailable("no tokio runtime"))?;

        let (tx, rx) = mpsc::channel(capacity.clamp(1, MAX_BEACON_CAPACITY));
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let task = handle.spawn(drain(rx, shutdown_rx, fetch));

        Ok((
            Self { tx },
            BeaconWorker {
                shutdown: Some(shutdown_tx),
                task,
            },
        ))
    }

    /// Free queue slots right now.
    pub fn available(&self) -> usize {
        self.tx.capacity()
    }
}

impl Beacon for QueueBeacon {
    fn send_beacon(&self, endpoint: &str, body: &[u8]) -> Result<bool, TransportError> {
        let item = BeaconItem {
            endpoint: endpoint.to_string(),
            body: Zeroizing::new(body.to_vec()),
        };
        match self.tx.try_send(item) {
            Ok(()) => Ok(true),
            Err(mpsc::error::TrySendError::Full(_)) => Ok(false),
            Err(mpsc::error::TrySendError::Closed(_)) => Err(TransportError::Closed),
        }
    }
}

/// Handle to the background task draining a [`QueueBeacon`].
///
/// Dropping the handle leaves the worker running until every
/// `QueueBeacon` clone is gone.
#[derive(Debug)]
pub struct BeaconWorker {
    shutdown: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl BeaconWorker {
    /// Deliver everything already queued, then stop.
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Err(e) = self.task.await {
            tracing::debug!(error = %e, "beacon worker ended abnormally");
        }
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

async fn drain(
    mut rx: mpsc::Receiver<BeaconItem>,
    mut shutdown: oneshot::Receiver<()>,
    fetch: Arc<dyn Fetch>,
) {
    // Set once the `BeaconWorker` is dropped without calling `shutdown`.
    let mut detached = false;
    loop {
        tokio::select! {
            biased;
            signal = &mut shutdown, if !detached => {
                if signal.is_err() {
                    detached = true;
                    continue;
                }
                rx.close();
                while let Some(item) = rx.recv().await {
                    deliver(fetch.as_ref(), item).await;
                }
                break;
            }
            item = rx.recv() => match item {
                Some(item) => deliver(fetch.as_ref(), item).await,
                None => break,
            },
        }
    }
    tracing::trace!("beacon worker stopped");
}

async fn deliver(fetch: &dyn Fetch, item: BeaconItem) {
    let request = FetchRequest {
        endpoint: item.endpoint,
        body: item.body,
        keepalive: true,
    };
    // A panicking transport must not take the worker down with it.
    match AssertUnwindSafe(fetch.post(request)).catch_unwind().await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => tracing::debug!(error = %e, "queued beacon delivery failed"),
        Err(_) => tracing::debug!("queued beacon delivery panicked"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Debug, Default)]
    struct Recorder {
        seen: Mutex<Vec<FetchRequest>>,
    }

    #[async_trait]
    impl Fetch for Recorder {
        async fn post(&self, request: FetchRequest) -> Result<(), TransportError> {
            self.seen.lock().unwrap().push(request);
            Ok(())
        }
    }

    #[test]
    fn url_join_handles_slashes() {
        let fetch = HttpFetch::new(Client::new(), "http://collector:8080/");
        assert_eq!(fetch.url_for("/api/report-error"), "http://collector:8080/api/report-error");
        assert_eq!(fetch.url_for("api/report-error"), "http://collector:8080/api/report-error");
        assert_eq!(fetch.url_for("https://elsewhere/x"), "https://elsewhere/x");
    }

    #[test]
    fn queue_beacon_needs_a_runtime() {
        let fetch: Arc<dyn Fetch> = Arc::new(Recorder::default());
        let err = QueueBeacon::spawn(4, fetch).unwrap_err();
        assert!(matches!(err, TransportError::Unavailable(_)));
    }

    #[tokio::test]
    async fn shutdown_drains_queued_beacons() {
        let recorder = Arc::new(Recorder::default());
        let (beacon, worker) = QueueBeacon::spawn(8, recorder.clone()).unwrap();

        for i in 0..5 {
            let body = format!("{{\"n\":{i}}}");
            assert!(beacon.send_beacon("/api/report-error", body.as_bytes()).unwrap());
        }
        worker.shutdown().await;

        let seen = recorder.seen.lock().unwrap();
        assert_eq!(seen.len(), 5);
        assert!(seen.iter().all(|r| r.keepalive && r.endpoint == "/api/report-error"));
    }

    #[tokio::test]
    async fn full_queue_declines() {
        #[derive(Debug)]
        struct Stuck;

        #[async_trait]
        impl Fetch for Stuck {
            async fn post(&self, _request: FetchRequest) -> Result<(), TransportError> {
                std::future::pending().await
            }
        }

        let (beacon, _worker) = QueueBeacon::spawn(1, Arc::new(Stuck)).unwrap();
        // The worker may already hold the first item, so fill until declined.
        let mut accepted = 0;
        while beacon.send_beacon("/e", b"{}").unwrap() {
            accepted += 1;
            assert!(accepted <= 2, "bounded queue kept accepting");
        }
        assert!(!beacon.send_beacon("/e", b"{}").unwrap());
    }

    #[tokio::test]
    async fn oversized_capacity_is_clamped() {
        let (beacon, worker) = QueueBeacon::spawn(usize::MAX, Arc::new(Recorder::default())).unwrap();
        assert_eq!(beacon.available(), MAX_BEACON_CAPACITY);
        worker.shutdown().await;

        let (beacon, worker) = QueueBeacon::spawn(0, Arc::new(Recorder::default())).unwrap();
        assert_eq!(beacon.available(), 1);
        worker.shutdown().await;
    }

    #[tokio::test]
    async fn panicking_fetch_does_not_stop_the_worker() {
        #[derive(Debug, Default)]
        struct Flaky {
            calls: Mutex<usize>,
            delivered: Mutex<Vec<FetchRequest>>,
        }

        #[async_trait]
        impl Fetch for Flaky {
            async fn post(&self, request: FetchRequest) -> Result<(), TransportError> {
                let first = {
                    let mut calls = self.calls.lock().unwrap();
                    *calls += 1;
                    *calls == 1
                };
                if first {
                    panic!("transport blew up");
                }
                self.delivered.lock().unwrap().push(request);
                Ok(())
            }
        }

        let flaky = Arc::new(Flaky::default());
        let (beacon, worker) = QueueBeacon::spawn(8, flaky.clone()).unwrap();
        for i in 0..3 {
            let body = format!("{{\"n\":{i}}}");
            assert!(beacon.send_beacon("/api/report-error", body.as_bytes()).unwrap());
        }
        worker.shutdown().await;

        assert_eq!(*flaky.calls.lock().unwrap(), 3);
        let delivered = flaky.delivered.lock().unwrap();
        assert_eq!(delivered.len(), 2);
        assert_eq!(&delivered[1].body[..], br#"{"n":2}"#);
    }

    #[test]
    fn reports_are_posted() {
        assert_eq!(REPORT_METHOD, Method::POST);
        assert_eq!(REPORT_METHOD.as_str(), "POST");
    }

    #[tokio::test]
    async fn closed_queue_is_an_error() {
        let (beacon, worker) = QueueBeacon::spawn(2, Arc::new(Recorder::default())).unwrap();
        worker.shutdown().await;
        assert!(matches!(
            beacon.send_beacon("/e", b"{}"),
            Err(TransportError::Closed)
        ));
    }
}
