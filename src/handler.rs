//! Boundary handler: normalize, annotate, log, report, notify.

use crate::classify::{normalize, Caught};
use crate::reporter::{installed_reporter, ErrorReporter};
use crate::AppError;
use std::fmt;
use std::sync::Arc;

/// Callback invoked with every handled error and the handler context.
pub type ErrorCallback = Arc<dyn Fn(&AppError, Option<&str>) + Send + Sync>;

/// Switches for [`ErrorHandler`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandlerOptions {
    /// Emit a `tracing` event per handled error.
    pub should_log: bool,
    /// Spawn a report when a reporter is attached.
    pub should_report: bool,
}

impl Default for HandlerOptions {
    fn default() -> Self {
        Self {
            should_log: true,
            should_report: false,
        }
    }
}

/// Turns whatever a call site caught into an [`AppError`].
///
/// ```rust
/// use app_errors::{Caught, ErrorCode, ErrorHandler};
/// use std::sync::{Arc, Mutex};
///
/// let seen = Arc::new(Mutex::new(Vec::new()));
/// let sink = Arc::clone(&seen);
/// let handler = ErrorHandler::new()
///     .without_logging()
///     .on_error(move |err, ctx| sink.lock().unwrap().push((err.code(), ctx.map(str::to_owned))));
///
/// let err = handler.handle(Caught::from(404.0), Some("ResultsPage"));
/// assert_eq!(err.user_message(), "404");
/// assert_eq!(seen.lock().unwrap()[0], (ErrorCode::UnknownError, Some("ResultsPage".into())));
/// ```
#[derive(Clone, Default)]
pub struct ErrorHandler {
    options: HandlerOptions,
    reporter: Option<Arc<ErrorReporter>>,
    callback: Option<ErrorCallback>,
}

impl ErrorHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(mut self, options: HandlerOptions) -> Self {
        self.options = options;
        self
    }

    pub fn without_logging(mut self) -> Self {
        self.options.should_log = false;
        self
    }

    /// Attach a reporter and turn reporting on.
    pub fn with_reporting(mut self, reporter: Arc<ErrorReporter>) -> Self {
        self.reporter = Some(reporter);
        self.options.should_report = true;
        self
    }

    /// Use the process-wide reporter, if one is installed right now.
    pub fn with_installed_reporter(self) -> Self {
        match installed_reporter() {
            Some(reporter) => self.with_reporting(reporter),
            None => self,
        }
    }

    pub fn on_error<F>(mut self, callback: F) -> Self
    where
        F: Fn(&AppError, Option<&str>) + Send + Sync + 'static,
    {
        self.callback = Some(Arc::new(callback));
        self
    }

    #[inline]
    pub const fn options(&self) -> HandlerOptions {
        self.options
    }

    /// Normalize `caught` and run the side effects.
    ///
    /// Already normalized errors keep their code and correlation id, also
    /// when they arrive type-erased as a native error. A non-empty `context`
    /// is stored as the error's handler context.
    pub fn handle(&self, caught: impl Into<Caught>, context: Option<&str>) -> AppError {
        let context = context.filter(|c| !c.is_empty());
        let caught = caught.into();
        let kind = caught.kind();
        let mut err = normalize(caught);

        if let Some(context) = context {
            err.set_handler_context(context);
        }

        if self.options.should_log {
            tracing::debug!(
                caught = kind,
                code = %err.code(),
                correlation_id = err.correlation_id(),
                "normalized caught value"
            );
            err.log().emit();
        }

        if self.options.should_report {
            if let Some(reporter) = &self.reporter {
                reporter.spawn_report(&err, context.map(|c| HandlerExtra { handler_context: c }).as_ref());
            }
        }

        if let Some(callback) = &self.callback {
            callback(&err, context);
        }

        err
    }
}

impl fmt::Debug for ErrorHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErrorHandler")
            .field("options", &self.options)
            .field("reporter", &self.reporter)
            .field("callback", &self.callback.as_ref().map(|_| "<fn>"))
            .finish()
    }
}

#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct HandlerExtra<'a> {
    handler_context: &'a str,
}
