//! Error construction.
//!
//! [`create_error`] is the single entry point every other constructor in the
//! crate funnels through. It is total: any code, any combination of options,
//! always yields a fully-populated [`AppError`].
//!
//! # Resolution Order
//!
//! | Field | First present wins |
//! |---|---|
//! | `message` | custom message, catalog `user_message`, [`default_message`] |
//! | `userMessage` | custom message, catalog `user_message`, [`default_user_message`] |
//! | `action` | catalog, [`default_action`] |
//! | `severity` | catalog, [`default_severity`] |
//! | `canRetry` | catalog (including an explicit `false`), [`default_can_retry`] |
//!
//! An unknown catalog key is not an error; it behaves as if no key was given.

use crate::correlation::{default_generator, IdGenerator};
use crate::definitions;
use crate::models::{CreateOptions, ErrorCause};
use crate::{AppError, ErrorCode, ErrorContext, ErrorSeverity};
use chrono::Utc;
use std::error::Error;
use std::fmt::Write as _;
use std::sync::Arc;

/// Upper bound on how many `source()` links are rendered into `stack`.
const MAX_CHAIN_DEPTH: usize = 16;

// ============================================================================
// Factory
// ============================================================================

/// Error factory bound to one correlation id source.
///
/// Most callers use [`create_error`], which runs on the process default
/// generator. Bind a custom generator when ids must be deterministic.
#[derive(Debug, Clone)]
pub struct ErrorFactory {
    ids: Arc<dyn IdGenerator>,
}

impl Default for ErrorFactory {
    fn default() -> Self {
        Self {
            ids: default_generator(),
        }
    }
}

impl ErrorFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_generator(ids: Arc<dyn IdGenerator>) -> Self {
        Self { ids }
    }

    pub fn generator(&self) -> &Arc<dyn IdGenerator> {
        &self.ids
    }

    /// Build an error. See the module docs for the resolution order.
    pub fn create(
        &self,
        code: ErrorCode,
        context: Option<ErrorContext>,
        message_key: Option<&str>,
        options: CreateOptions,
    ) -> AppError {
        let preset = message_key.and_then(definitions::lookup);

        let custom = options.effective_message();
        let message = custom
            .or(preset.map(|p| p.user_message))
            .unwrap_or(default_message(code))
            .to_string();
        let user_message = custom
            .or(preset.map(|p| p.user_message))
            .unwrap_or(default_user_message(code))
            .to_string();

        let action = preset.map_or(default_action(code), |p| p.action);
        let severity = preset.map_or(default_severity(code), |p| p.severity);
        let can_retry = preset.map_or(default_can_retry(code), |p| p.can_retry);

        let correlation_id = match options.effective_correlation_id() {
            Some(id) => id.to_string(),
            None => self.ids.next_id(),
        };

        let stack = options.cause.as_ref().map(render_chain);

        AppError {
            code,
            context: context.unwrap_or_default(),
            message,
            user_message,
            action: action.to_string(),
            severity,
            can_retry,
            correlation_id,
            timestamp: Utc::now(),
            details: options.details,
            cause: options.cause,
            stack,
            metadata: options.metadata,
        }
    }
}

/// Build an error with the process default id generator.
///
/// # Example
///
/// ```rust
/// use app_errors::{create_error, definitions::keys, CreateOptions, ErrorCode, ErrorContext};
///
/// let err = create_error(
///     ErrorCode::FileEmpty,
///     Some(ErrorContext::FileUpload),
///     Some(keys::FILE_EMPTY),
///     CreateOptions::default(),
/// );
/// assert!(!err.can_retry());
/// assert_eq!(err.message(), err.user_message());
/// ```
#[inline]
pub fn create_error(
    code: ErrorCode,
    context: Option<ErrorContext>,
    message_key: Option<&str>,
    options: CreateOptions,
) -> AppError {
    ErrorFactory::default().create(code, context, message_key, options)
}

/// Render a cause and its `source()` chain, one link per line.
pub(crate) fn render_chain(cause: &ErrorCause) -> String {
    let mut out = cause.to_string();
    let mut next = cause.source();
    let mut depth = 0;
    while let Some(err) = next {
        if depth == MAX_CHAIN_DEPTH {
            out.push_str("\ncaused by: ...");
            break;
        }
        let _ = write!(out, "\ncaused by: {err}");
        next = err.source();
        depth += 1;
    }
    out
}

// ============================================================================
// Code-based Defaults
// ============================================================================
//
// Only the family root codes get specific wording. Every sub-kind falls into
// the unknown bucket unless a catalog key is supplied, which is how the
// common builders always call the factory.

/// Developer-facing fallback message.
pub const fn default_message(code: ErrorCode) -> &'static str {
    match code {
        ErrorCode::FileError => "File processing error",
        ErrorCode::ValidationError => "Data validation failed",
        ErrorCode::PrivacyError => "Privacy check failed",
        ErrorCode::AuthError => "Authentication error",
        ErrorCode::AnalysisError => "Analysis error",
        ErrorCode::NetworkError => "Network error",
        ErrorCode::ServerError => "Server error",
        _ => "Unknown error",
    }
}

/// User-facing fallback message.
pub const fn default_user_message(code: ErrorCode) -> &'static str {
    match code {
        ErrorCode::FileError => "Something went wrong while processing the file. Please choose the file again.",
        ErrorCode::ValidationError => "The data format is not valid. Please check the file contents.",
        ErrorCode::PrivacyError => "The file contains sensitive data. Please remove it and upload again.",
        ErrorCode::AuthError => "Authentication failed. Please sign in again.",
        ErrorCode::AnalysisError => "Something went wrong during the analysis. Please try again.",
        ErrorCode::NetworkError => "There is a network problem. Please check your connection.",
        ErrorCode::ServerError => "The server is temporarily unavailable. Please try again later.",
        _ => "An unexpected error occurred. Please try again or contact support.",
    }
}

/// Suggested next step.
pub const fn default_action(code: ErrorCode) -> &'static str {
    match code {
        ErrorCode::FileError => "Choose a valid file",
        ErrorCode::ValidationError => "Check the data format and upload again",
        ErrorCode::PrivacyError => "Remove sensitive data and upload again",
        ErrorCode::AuthError => "Sign in again",
        ErrorCode::AnalysisError => "Retry or contact support",
        ErrorCode::NetworkError => "Check your connection and retry",
        ErrorCode::ServerError => "Retry later",
        _ => "Retry or contact support",
    }
}

pub const fn default_severity(code: ErrorCode) -> ErrorSeverity {
    match code {
        ErrorCode::PrivacyError | ErrorCode::AuthError => ErrorSeverity::High,
        ErrorCode::ServerError => ErrorSeverity::High,
        ErrorCode::FileError | ErrorCode::ValidationError | ErrorCode::AnalysisError => {
            ErrorSeverity::Medium
        }
        ErrorCode::NetworkError => ErrorSeverity::Low,
        _ => ErrorSeverity::Medium,
    }
}

/// Retryable unless the failure is a property of the input itself.
pub const fn default_can_retry(code: ErrorCode) -> bool {
    match code {
        ErrorCode::FileFormatUnsupported
        | ErrorCode::FileSizeExceeded
        | ErrorCode::SensitiveDataDetected
        | ErrorCode::AuthTokenMissing => false,
        _ => true,
    }
}

// ============================================================================
// Tests
// ============================================================================
