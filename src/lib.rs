//! # App Errors
//!
//! Error normalization, classification and best-effort reporting for a
//! client talking to a remote analysis backend.
//!
//! ## Design Philosophy
//!
//! 1. **Every failure becomes one shape**: whatever was caught, callers get an
//!    [`AppError`] with a code, user-facing wording, retry hint and a
//!    correlation id
//! 2. **Wording lives in a catalog**, not at call sites
//! 3. **Construction never fails**: every field has a default derivable from
//!    the code alone
//! 4. **Reporting never fails either**: delivery is best effort, primary
//!    channel first, one fallback, all errors swallowed
//!
//! ## Quick Start
//!
//! ```rust
//! use app_errors::{convenience, Caught, ErrorCode, ErrorHandler};
//!
//! let err = convenience::file_size_exceeded(15_728_640, 10_485_760);
//! assert_eq!(err.code(), ErrorCode::FileSizeExceeded);
//! assert!(err.user_message().contains("15 MB"));
//! assert!(!err.can_retry());
//!
//! // Anything caught can be normalized the same way.
//! let handler = ErrorHandler::new().without_logging();
//! let handled = handler.handle(Caught::from("socket closed"), Some("UploadStep"));
//! assert_eq!(handled.code(), ErrorCode::UnknownError);
//! assert_eq!(handled.user_message(), "socket closed");
//! ```
//!
//! ## Reporting
//!
//! ```rust,no_run
//! use app_errors::{convenience, ErrorReporter, ReporterConfig};
//!
//! # async fn run() {
//! let reporter = ErrorReporter::from_config(&ReporterConfig::default());
//! reporter.report(&convenience::network_error(), None::<&()>).await;
//! # }
//! ```

#![warn(clippy::all)]

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt;
use std::result;

pub mod classify;
pub mod codes;
pub mod config;
pub mod context;
pub mod convenience;
pub mod correlation;
pub mod definitions;
pub mod factory;
pub mod handler;
pub mod http;
pub mod logging;
pub mod models;
pub mod reporter;
pub mod ring_buffer;
pub mod transport;

pub use classify::*;
pub use codes::*;
pub use config::*;
pub use context::*;
pub use correlation::{IdGenerator, TimestampIdGenerator, UuidV4Generator};
pub use definitions::MessageConfig;
pub use factory::{create_error, ErrorFactory};
pub use handler::*;
pub use http::*;
pub use logging::*;
pub use models::*;
pub use reporter::*;
pub use ring_buffer::*;
pub use transport::*;

/// Type alias for Results using our error type.
pub type Result<T> = result::Result<T, AppError>;

// ============================================================================
// Normalized Error
// ============================================================================

/// The normalized error value handed to UI code and the reporter.
///
/// # Key Properties
///
/// - Immutable once built, apart from handler-context enrichment
/// - Every field populated, see [`factory`] for the resolution order
/// - `correlation_id` unique per construction
/// - `cause` stays in-process (exposed through [`Error::source`]); its
///   rendered chain travels as `stack`
///
/// Built by [`create_error`] and everything layered on top of it
/// ([`convenience`], [`http`], [`ErrorBuilder`]).
#[must_use = "errors should be handled or logged"]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppError {
    pub(crate) code: ErrorCode,
    #[serde(default)]
    pub(crate) context: ErrorContext,
    pub(crate) message: String,
    pub(crate) user_message: String,
    pub(crate) action: String,
    pub(crate) severity: ErrorSeverity,
    pub(crate) can_retry: bool,
    pub(crate) correlation_id: String,
    pub(crate) timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) details: Option<ErrorDetails>,
    #[serde(skip)]
    pub(crate) cause: Option<ErrorCause>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) stack: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) metadata: Option<ErrorMetadata>,
}

impl AppError {
    #[inline]
    pub const fn code(&self) -> ErrorCode {
        self.code
    }

    #[inline]
    pub const fn family(&self) -> ErrorFamily {
        self.code.family()
    }

    #[inline]
    pub const fn context(&self) -> ErrorContext {
        self.context
    }

    /// Developer-facing message.
    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Message safe to show to the end user.
    #[inline]
    pub fn user_message(&self) -> &str {
        &self.user_message
    }

    #[inline]
    pub fn action(&self) -> &str {
        &self.action
    }

    #[inline]
    pub const fn severity(&self) -> ErrorSeverity {
        self.severity
    }

    #[inline]
    pub const fn can_retry(&self) -> bool {
        self.can_retry
    }

    #[inline]
    pub fn correlation_id(&self) -> &str {
        &self.correlation_id
    }

    #[inline]
    pub const fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    #[inline]
    pub fn details(&self) -> Option<&ErrorDetails> {
        self.details.as_ref()
    }

    /// Underlying native error, if one was captured in this process.
    #[inline]
    pub fn cause(&self) -> Option<&ErrorCause> {
        self.cause.as_ref()
    }

    /// Rendered cause chain.
    #[inline]
    pub fn stack(&self) -> Option<&str> {
        self.stack.as_deref()
    }

    #[inline]
    pub fn metadata(&self) -> Option<&ErrorMetadata> {
        self.metadata.as_ref()
    }

    /// Record which handler saw this error, creating metadata if needed.
    ///
    /// This is the only mutation an error undergoes after construction.
    #[inline]
    pub fn with_handler_context(mut self, handler_context: impl Into<String>) -> Self {
        self.set_handler_context(handler_context);
        self
    }

    #[inline]
    pub fn set_handler_context(&mut self, handler_context: impl Into<String>) {
        self.metadata
            .get_or_insert_with(ErrorMetadata::default)
            .handler_context = Some(handler_context.into());
    }

    /// Borrowed log view of this error.
    ///
    /// The returned `ErrorLog` cannot outlive the error, so loggers consume
    /// it immediately instead of holding copies of user data.
    #[inline]
    pub fn log(&self) -> ErrorLog<'_> {
        ErrorLog::new(self)
    }

    /// Callback-style access to the log view.
    #[inline]
    pub fn with_log<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&ErrorLog<'_>) -> R,
    {
        let log = self.log();
        f(&log)
    }
}

impl fmt::Display for AppError {
    /// Format: `[{CODE}] {user message}`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.user_message)
    }
}

impl Error for AppError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.cause
            .as_deref()
            .map(|e| e as &(dyn Error + 'static))
    }
}
