//! Best-effort delivery of error reports.
//!
//! One report is one JSON body: every serialized [`AppError`] field plus an
//! optional `extra` value from the caller. Delivery is strictly sequenced:
//!
//! 1. the [`Beacon`], when configured; acceptance ends delivery
//! 2. otherwise exactly one [`Fetch`] `POST` with the same body
//!
//! Nothing on this path reaches the caller. Encoding failures, transport
//! errors, non-2xx answers and panics inside transports are logged at
//! `debug` and recorded in the reporter's [`DeliveryLedger`].

use crate::config::{ReporterConfig, DEFAULT_ENDPOINT};
use crate::ring_buffer::{DeliveryLedger, DeliveryOutcome};
use crate::transport::{Beacon, BeaconWorker, Fetch, FetchRequest, HttpFetch, QueueBeacon, TransportError};
use crate::AppError;
use futures::FutureExt;
use serde::Serialize;
use serde_json::Value;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, RwLock};
use tokio::task::JoinHandle;
use zeroize::Zeroizing;

/// Key under which caller context is attached to the report body.
pub const EXTRA_KEY: &str = "extra";

/// Ships [`AppError`]s to a collection endpoint.
///
/// Cheap to clone; clones share transports and ledger.
#[derive(Debug, Clone)]
pub struct ErrorReporter {
    endpoint: Arc<str>,
    enabled: bool,
    keepalive: bool,
    beacon: Option<Arc<dyn Beacon>>,
    fetch: Option<Arc<dyn Fetch>>,
    ledger: DeliveryLedger,
}

impl Default for ErrorReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ErrorReporter {
    /// Reporter for [`DEFAULT_ENDPOINT`] with no transports attached.
    pub fn new() -> Self {
        Self {
            endpoint: Arc::from(DEFAULT_ENDPOINT),
            enabled: true,
            keepalive: true,
            beacon: None,
            fetch: None,
            ledger: DeliveryLedger::default(),
        }
    }

    /// Build transports from configuration.
    ///
    /// A config that fails [`ReporterConfig::validate`] yields a disabled
    /// reporter. Otherwise `HttpFetch` always; a [`QueueBeacon`] only when called inside a tokio
    /// runtime. The beacon worker runs detached and stops once every clone
    /// of the reporter is gone. Use [`from_config_with_worker`] to flush it
    /// on shutdown.
    ///
    /// [`from_config_with_worker`]: Self::from_config_with_worker
    pub fn from_config(config: &ReporterConfig) -> Self {
        Self::from_config_with_worker(config).0
    }

    /// Like [`from_config`](Self::from_config), also returning the beacon
    /// worker handle when one was started.
    pub fn from_config_with_worker(
        config: &ReporterConfig,
    ) -> (Self, Option<BeaconWorker>) {
        let mut reporter = Self::new()
            .with_endpoint(config.endpoint.as_str())
            .with_keepalive(config.keepalive)
            .enabled(config.enabled);

        if !config.enabled {
            return (reporter, None);
        }

        if let Err(e) = config.validate() {
            tracing::warn!(error = %e, "error reporting disabled: invalid configuration");
            return (reporter.enabled(false), None);
        }

        let fetch: Arc<dyn Fetch> =
            match HttpFetch::with_timeout(config.base_url.as_str(), config.request_timeout()) {
                Ok(fetch) => Arc::new(fetch),
                Err(e) => {
                    tracing::warn!(error = %e, "error reporting disabled: http client unavailable");
                    return (reporter.enabled(false), None);
                }
            };
        reporter.fetch = Some(Arc::clone(&fetch));

        match QueueBeacon::spawn(config.beacon_capacity, fetch) {
            Ok((beacon, worker)) => {
                reporter.beacon = Some(Arc::new(beacon));
                (reporter, Some(worker))
            }
            Err(TransportError::Unavailable(reason)) => {
                tracing::debug!(reason, "no beacon transport, reports go straight to fetch");
                (reporter, None)
            }
            Err(e) => {
                tracing::debug!(error = %e, "beacon transport failed to start");
                (reporter, None)
            }
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl AsRef<str>) -> Self {
        self.endpoint = Arc::from(endpoint.as_ref());
        self
    }

    pub fn with_beacon(mut self, beacon: Arc<dyn Beacon>) -> Self {
        self.beacon = Some(beacon);
        self
    }

    pub fn with_fetch(mut self, fetch: Arc<dyn Fetch>) -> Self {
        self.fetch = Some(fetch);
        self
    }

    pub fn with_keepalive(mut self, keepalive: bool) -> Self {
        self.keepalive = keepalive;
        self
    }

    pub fn with_ledger(mut self, ledger: DeliveryLedger) -> Self {
        self.ledger = ledger;
        self
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    #[inline]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    #[inline]
    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }

    #[inline]
    pub const fn keepalive(&self) -> bool {
        self.keepalive
    }

    #[inline]
    pub fn ledger(&self) -> &DeliveryLedger {
        &self.ledger
    }

    /// Deliver one report. Never fails, never panics.
    pub async fn report<E>(&self, error: &AppError, extra: Option<&E>)
    where
        E: Serialize + ?Sized,
    {
        if !self.enabled {
            return;
        }
        let Some(body) = self.encode_or_record(error, extra) else {
            return;
        };
        let outcome = self.deliver(&body).await;
        self.ledger.record(error, outcome, body.len());
    }

    /// Fire-and-forget variant of [`report`](Self::report).
    ///
    /// The body is encoded before returning. Delivery runs on the current
    /// tokio runtime; outside a runtime only the beacon is attempted, inline.
    /// Returns the delivery task when one was spawned.
    pub fn spawn_report<E>(&self, error: &AppError, extra: Option<&E>) -> Option<JoinHandle<()>>
    where
        E: Serialize + ?Sized,
    {
        if !self.enabled {
            return None;
        }
        let body = self.encode_or_record(error, extra)?;

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let reporter = self.clone();
                let error = error.clone();
                Some(handle.spawn(async move {
                    let outcome = reporter.deliver(&body).await;
                    reporter.ledger.record(&error, outcome, body.len());
                }))
            }
            Err(_) => {
                let outcome = if self.try_beacon(&body) {
                    DeliveryOutcome::Beacon
                } else {
                    tracing::debug!(code = %error.code(), "no runtime for fallback delivery, report dropped");
                    DeliveryOutcome::Failed
                };
                self.ledger.record(error, outcome, body.len());
                None
            }
        }
    }

    fn encode_or_record<E>(&self, error: &AppError, extra: Option<&E>) -> Option<Zeroizing<Vec<u8>>>
    where
        E: Serialize + ?Sized,
    {
        match encode_report(error, extra) {
            Ok(body) => Some(body),
            Err(e) => {
                tracing::debug!(
                    error = %e,
                    code = %error.code(),
                    correlation_id = %error.correlation_id(),
                    "error report could not be encoded"
                );
                self.ledger.record(error, DeliveryOutcome::EncodeFailed, 0);
                None
            }
        }
    }

    async fn deliver(&self, body: &Zeroizing<Vec<u8>>) -> DeliveryOutcome {
        if self.try_beacon(body) {
            return DeliveryOutcome::Beacon;
        }

        let Some(fetch) = &self.fetch else {
            tracing::debug!("no fallback transport configured, report dropped");
            return DeliveryOutcome::Failed;
        };

        let request = FetchRequest {
            endpoint: self.endpoint.to_string(),
            body: body.clone(),
            keepalive: self.keepalive,
        };
        match AssertUnwindSafe(fetch.post(request)).catch_unwind().await {
            Ok(Ok(())) => DeliveryOutcome::Fetch,
            Ok(Err(e)) => {
                tracing::debug!(error = %e, "fallback report delivery failed");
                DeliveryOutcome::Failed
            }
            Err(_) => {
                tracing::debug!("fallback transport panicked");
                DeliveryOutcome::Failed
            }
        }
    }

    /// True only when a beacon exists and accepted the body.
    fn try_beacon(&self, body: &[u8]) -> bool {
        let Some(beacon) = &self.beacon else {
            return false;
        };
        match catch_unwind(AssertUnwindSafe(|| beacon.send_beacon(&self.endpoint, body))) {
            Ok(Ok(accepted)) => accepted,
            Ok(Err(e)) => {
                tracing::debug!(error = %e, "beacon rejected report");
                false
            }
            Err(_) => {
                tracing::debug!("beacon transport panicked");
                false
            }
        }
    }
}

/// Encode a report body: the error's fields plus `extra` under
/// [`EXTRA_KEY`] when given.
pub fn encode_report<E>(
    error: &AppError,
    extra: Option<&E>,
) -> Result<Zeroizing<Vec<u8>>, serde_json::Error>
where
    E: Serialize + ?Sized,
{
    let mut value = serde_json::to_value(error)?;
    if let (Some(extra), Value::Object(fields)) = (extra, &mut value) {
        fields.insert(EXTRA_KEY.to_string(), serde_json::to_value(extra)?);
    }
    serde_json::to_vec(&value).map(Zeroizing::new)
}

// ============================================================================
// Process-wide Reporter
// ============================================================================

static INSTALLED: RwLock<Option<Arc<ErrorReporter>>> = RwLock::new(None);

/// Install the process-wide reporter used by [`report_error`] and by
/// handlers built with [`ErrorHandler::with_installed_reporter`].
///
/// Returns the previously installed reporter.
///
/// [`ErrorHandler::with_installed_reporter`]: crate::ErrorHandler::with_installed_reporter
pub fn install_reporter(reporter: ErrorReporter) -> Option<Arc<ErrorReporter>> {
    let mut slot = match INSTALLED.write() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };
    slot.replace(Arc::new(reporter))
}

/// Remove the process-wide reporter.
pub fn uninstall_reporter() -> Option<Arc<ErrorReporter>> {
    let mut slot = match INSTALLED.write() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };
    slot.take()
}

pub fn installed_reporter() -> Option<Arc<ErrorReporter>> {
    let slot = match INSTALLED.read() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };
    slot.clone()
}

/// Report through the installed reporter. Without one the report is
/// dropped.
pub async fn report_error<E>(error: &AppError, extra: Option<&E>)
where
    E: Serialize + ?Sized,
{
    match installed_reporter() {
        Some(reporter) => reporter.report(error, extra).await,
        None => tracing::debug!(code = %error.code(), "no reporter installed, report dropped"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convenience;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug)]
    struct FixedBeacon {
        answer: bool,
        calls: AtomicUsize,
    }

    impl Beacon for FixedBeacon {
        fn send_beacon(&self, _endpoint: &str, _body: &[u8]) -> Result<bool, TransportError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.answer)
        }
    }

    #[test]
    fn body_flattens_error_and_nests_extra() {
        let err = convenience::network_error();
        let body = encode_report(&err, Some(&json!({"component": "Uploader", "rows": 12}))).unwrap();
        let value: Value = serde_json::from_slice(&body).unwrap();

        assert_eq!(value["code"], "NETWORK_ERROR");
        assert_eq!(value["correlationId"], err.correlation_id());
        assert_eq!(value["severity"], "MEDIUM");
        assert_eq!(value["extra"]["component"], "Uploader");
        assert_eq!(value["extra"]["rows"], 12);
    }

    #[test]
    fn body_without_extra_has_no_extra_key() {
        let body = encode_report(&convenience::file_empty(), None::<&()>).unwrap();
        let value: Value = serde_json::from_slice(&body).unwrap();
        assert!(value.get(EXTRA_KEY).is_none());
    }

    #[tokio::test]
    async fn disabled_reporter_records_nothing() {
        let beacon = Arc::new(FixedBeacon { answer: true, calls: AtomicUsize::new(0) });
        let reporter = ErrorReporter::new().with_beacon(beacon.clone()).enabled(false);

        reporter.report(&convenience::network_error(), None::<&()>).await;
        assert_eq!(beacon.calls.load(Ordering::SeqCst), 0);
        assert!(reporter.ledger().is_empty());
    }

    #[tokio::test]
    async fn no_transport_is_a_recorded_failure() {
        let reporter = ErrorReporter::new();
        let err = convenience::server_error(None);
        reporter.report(&err, None::<&()>).await;

        let record = reporter.ledger().find(err.correlation_id()).unwrap();
        assert_eq!(record.outcome, DeliveryOutcome::Failed);
    }

    #[test]
    fn spawn_report_outside_runtime_uses_beacon_only() {
        let beacon = Arc::new(FixedBeacon { answer: true, calls: AtomicUsize::new(0) });
        let reporter = ErrorReporter::new().with_beacon(beacon.clone());
        let err = convenience::rate_limit_error();

        assert!(reporter.spawn_report(&err, None::<&()>).is_none());
        assert_eq!(beacon.calls.load(Ordering::SeqCst), 1);
        assert_eq!(reporter.ledger().total(DeliveryOutcome::Beacon), 1);
    }

    #[test]
    fn spawn_report_outside_runtime_declined_beacon_is_failure() {
        let beacon = Arc::new(FixedBeacon { answer: false, calls: AtomicUsize::new(0) });
        let reporter = ErrorReporter::new().with_beacon(beacon);

        reporter.spawn_report(&convenience::file_empty(), None::<&()>);
        assert_eq!(reporter.ledger().total(DeliveryOutcome::Failed), 1);
    }

    #[tokio::test]
    async fn from_config_inside_runtime_starts_a_beacon() {
        let (reporter, worker) = ErrorReporter::from_config_with_worker(&ReporterConfig::default());
        assert!(reporter.beacon.is_some());
        assert!(reporter.fetch.is_some());
        assert_eq!(reporter.endpoint(), DEFAULT_ENDPOINT);
        assert!(worker.is_some());
    }

    #[test]
    fn from_config_outside_runtime_has_fetch_only() {
        let reporter = ErrorReporter::from_config(&ReporterConfig::default());
        assert!(reporter.beacon.is_none());
        assert!(reporter.fetch.is_some());
    }

    #[test]
    fn disabled_config_builds_no_transports() {
        let config = ReporterConfig {
            enabled: false,
            ..ReporterConfig::default()
        };
        let reporter = ErrorReporter::from_config(&config);
        assert!(!reporter.is_enabled());
        assert!(reporter.beacon.is_none() && reporter.fetch.is_none());
    }

    #[tokio::test]
    async fn out_of_range_config_disables_reporting() {
        for beacon_capacity in [usize::MAX, 0] {
            let config = ReporterConfig {
                beacon_capacity,
                ..ReporterConfig::default()
            };
            let (reporter, worker) = ErrorReporter::from_config_with_worker(&config);
            assert!(!reporter.is_enabled(), "capacity {beacon_capacity}");
            assert!(reporter.beacon.is_none() && reporter.fetch.is_none());
            assert!(worker.is_none());
        }

        let config = ReporterConfig {
            request_timeout_ms: 0,
            ..ReporterConfig::default()
        };
        assert!(!ErrorReporter::from_config(&config).is_enabled());
    }
}
