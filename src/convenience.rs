//! Ready-made errors for recurring situations, plus the `app_error!` macro.
//!
//! Each builder is a thin, I/O-free call into
//! [`create_error`](crate::create_error) with a fixed code, context and
//! (usually) catalog key. They exist so call sites say *what* happened
//! (`file_empty()`) instead of restating how it should be worded.
//!
//! # Usage
//!
//! ```rust
//! use app_errors::{app_error, convenience, ErrorCode, ErrorContext};
//!
//! let err = convenience::file_size_exceeded(1_572_864, 1_048_576);
//! assert!(err.user_message().contains("1.5 MB"));
//!
//! let rows = 3;
//! let err = app_error!(
//!     ErrorCode::ValidationError,
//!     ErrorContext::DataValidation,
//!     "only {} rows, need at least 10",
//!     rows
//! );
//! assert_eq!(err.user_message(), "only 3 rows, need at least 10");
//! ```

use crate::definitions::keys;
use crate::models::{CreateOptions, ErrorCause, ErrorDetails};
use crate::{create_error, AppError, ErrorCode, ErrorContext};

const SIZE_UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];
const SIZE_BASE: f64 = 1024.0;

/// Render a byte count for humans: `0 Bytes`, `1.5 KB`, `15 MB`.
///
/// Powers of 1024, at most two decimals with trailing zeros dropped. Sizes
/// beyond the gigabyte range stay in GB.
pub fn format_file_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= SIZE_BASE && unit < SIZE_UNITS.len() - 1 {
        value /= SIZE_BASE;
        unit += 1;
    }

    let fixed = format!("{value:.2}");
    let trimmed = fixed.trim_end_matches('0').trim_end_matches('.');
    format!("{trimmed} {}", SIZE_UNITS[unit])
}

#[inline]
fn keyed(code: ErrorCode, context: ErrorContext, key: &'static str) -> AppError {
    create_error(code, Some(context), Some(key), CreateOptions::default())
}

#[inline]
fn worded(code: ErrorCode, context: ErrorContext, message: impl Into<String>) -> AppError {
    create_error(
        code,
        Some(context),
        None,
        CreateOptions::new().custom_message(message),
    )
}

// ============================================================================
// File
// ============================================================================

pub fn file_not_selected() -> AppError {
    worded(
        ErrorCode::ValidationError,
        ErrorContext::FileUpload,
        "Please select a file to upload first.",
    )
}

pub fn file_format_unsupported() -> AppError {
    keyed(
        ErrorCode::FileFormatUnsupported,
        ErrorContext::FileUpload,
        keys::FILE_FORMAT_UNSUPPORTED,
    )
}

/// Both sizes in bytes. They are also carried as `actualSize` / `maxSize`
/// details.
pub fn file_size_exceeded(actual_size: u64, max_size: u64) -> AppError {
    create_error(
        ErrorCode::FileSizeExceeded,
        Some(ErrorContext::FileUpload),
        Some(keys::FILE_SIZE_EXCEEDED),
        CreateOptions::new()
            .details(ErrorDetails::size(actual_size, max_size))
            .custom_message(format!(
                "File size {} exceeds the limit",
                format_file_size(actual_size)
            )),
    )
}

pub fn file_empty() -> AppError {
    keyed(ErrorCode::FileEmpty, ErrorContext::FileUpload, keys::FILE_EMPTY)
}

pub fn file_corrupted() -> AppError {
    keyed(
        ErrorCode::FileCorrupted,
        ErrorContext::FileProcessing,
        keys::FILE_CORRUPTED,
    )
}

// ============================================================================
// Privacy
// ============================================================================

pub fn sensitive_data_detected() -> AppError {
    keyed(
        ErrorCode::SensitiveDataDetected,
        ErrorContext::PrivacyCheck,
        keys::PRIVACY_SENSITIVE_DATA,
    )
}

pub fn privacy_agreement_required() -> AppError {
    worded(
        ErrorCode::PrivacyError,
        ErrorContext::PrivacyCheck,
        "Please accept the privacy statement before uploading a file.",
    )
}

// ============================================================================
// Auth
// ============================================================================

pub fn auth_token_missing() -> AppError {
    keyed(
        ErrorCode::AuthTokenMissing,
        ErrorContext::Authentication,
        keys::AUTH_TOKEN_MISSING,
    )
}

/// Defaults to the authentication context.
pub fn auth_error(context: Option<ErrorContext>) -> AppError {
    keyed(
        ErrorCode::AuthError,
        context.unwrap_or(ErrorContext::Authentication),
        keys::AUTH_UNAUTHORIZED,
    )
}

pub fn analysis_auth_failed() -> AppError {
    keyed(
        ErrorCode::AnalysisAuthFailed,
        ErrorContext::Analysis,
        keys::AUTH_UNAUTHORIZED,
    )
}

// ============================================================================
// Analysis
// ============================================================================

pub fn analysis_timeout() -> AppError {
    keyed(
        ErrorCode::AnalysisTimeout,
        ErrorContext::Analysis,
        keys::ANALYSIS_TIMEOUT,
    )
}

/// Catalog wording unless `message` is given.
pub fn analysis_failed(message: Option<&str>) -> AppError {
    let mut options = CreateOptions::new();
    options.custom_message = message.map(str::to_string);
    create_error(
        ErrorCode::AnalysisError,
        Some(ErrorContext::Analysis),
        Some(keys::ANALYSIS_FAILED),
        options,
    )
}

pub fn no_variables_selected() -> AppError {
    create_error(
        ErrorCode::AnalysisError,
        Some(ErrorContext::Analysis),
        Some(keys::ANALYSIS_NO_VARIABLES),
        CreateOptions::new().custom_message("No variables selected"),
    )
}

pub fn column_detection_failed() -> AppError {
    keyed(
        ErrorCode::ColumnTypeDetectionFailed,
        ErrorContext::Analysis,
        keys::COLUMN_TYPE_DETECTION_FAILED,
    )
}

// ============================================================================
// Validation
// ============================================================================

pub fn insufficient_data() -> AppError {
    worded(
        ErrorCode::ValidationError,
        ErrorContext::DataValidation,
        "Not enough data to run the analysis",
    )
}

pub fn invalid_data(message: Option<&str>) -> AppError {
    worded(
        ErrorCode::DataValidationFailed,
        ErrorContext::DataValidation,
        message.filter(|m| !m.is_empty()).unwrap_or("Invalid data format"),
    )
}

pub fn no_valid_columns() -> AppError {
    keyed(
        ErrorCode::ColumnValidationFailed,
        ErrorContext::DataValidation,
        keys::COLUMN_NO_VALID_COLUMNS,
    )
}

// ============================================================================
// Network
// ============================================================================

pub fn network_error() -> AppError {
    keyed(
        ErrorCode::NetworkError,
        ErrorContext::Network,
        keys::NETWORK_CONNECTION_FAILED,
    )
}

/// Defaults to the network context.
pub fn server_error(context: Option<ErrorContext>) -> AppError {
    keyed(
        ErrorCode::ServerError,
        context.unwrap_or(ErrorContext::Network),
        keys::NETWORK_SERVER_ERROR,
    )
}

pub fn rate_limit_error() -> AppError {
    keyed(
        ErrorCode::RateLimitError,
        ErrorContext::Network,
        keys::NETWORK_RATE_LIMIT,
    )
}

// ============================================================================
// Fallback
// ============================================================================

pub fn unknown_error(cause: Option<ErrorCause>, message: Option<&str>) -> AppError {
    let mut options = CreateOptions::new().custom_message(
        message
            .filter(|m| !m.is_empty())
            .unwrap_or("An unknown error occurred"),
    );
    options.cause = cause;
    create_error(ErrorCode::UnknownError, Some(ErrorContext::Unknown), None, options)
}

// ============================================================================
// Macro
// ============================================================================

/// Create an [`AppError`](crate::AppError) with a formatted custom message.
///
/// # Arguments
/// - `$code`: [`ErrorCode`](crate::ErrorCode)
/// - `$ctx`: [`ErrorContext`](crate::ErrorContext)
/// - `$fmt`: format string literal, followed by its arguments
///
/// Without a format string the error takes its wording from the code-based
/// defaults.
///
/// # Example
///
/// ```rust
/// # use app_errors::{app_error, ErrorCode, ErrorContext};
/// let err = app_error!(ErrorCode::AnalysisError, ErrorContext::Analysis);
/// assert_eq!(err.message(), "Analysis error");
///
/// let err = app_error!(ErrorCode::FileError, ErrorContext::FileProcessing, "sheet {} unreadable", 2);
/// assert_eq!(err.message(), "sheet 2 unreadable");
/// ```
#[macro_export]
macro_rules! app_error {
    ($code:expr, $ctx:expr $(,)?) => {
        $crate::create_error($code, Some($ctx), None, $crate::CreateOptions::default())
    };
    ($code:expr, $ctx:expr, $fmt:literal $(, $arg:expr)* $(,)?) => {
        $crate::create_error(
            $code,
            Some($ctx),
            None,
            $crate::CreateOptions::new().custom_message(format!($fmt $(, $arg)*)),
        )
    };
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definitions;
    use crate::ErrorSeverity;
    use std::io;
    use std::sync::Arc;

    #[test]
    fn file_sizes_render_like_humans_read_them() {
        assert_eq!(format_file_size(0), "0 Bytes");
        assert_eq!(format_file_size(1), "1 Bytes");
        assert_eq!(format_file_size(1023), "1023 Bytes");
        assert_eq!(format_file_size(1024), "1 KB");
        assert_eq!(format_file_size(1536), "1.5 KB");
        assert_eq!(format_file_size(10_485_760), "10 MB");
        assert_eq!(format_file_size(15_728_640), "15 MB");
        assert_eq!(format_file_size(1_288_490_189), "1.2 GB");
        assert_eq!(format_file_size(5 * 1024 * 1024 * 1024 * 1024), "5120 GB");
    }

    #[test]
    fn file_size_exceeded_scenario() {
        let err = file_size_exceeded(15_728_640, 10_485_760);

        assert_eq!(err.code(), ErrorCode::FileSizeExceeded);
        assert_eq!(err.context(), ErrorContext::FileUpload);
        assert!(err.user_message().contains("15 MB"));
        assert!(!err.can_retry());

        let details = err.details().unwrap();
        assert_eq!(details.actual_size, Some(15_728_640));
        assert_eq!(details.max_size, Some(10_485_760));

        let preset = definitions::lookup(keys::FILE_SIZE_EXCEEDED).unwrap();
        assert_eq!(err.action(), preset.action);
    }

    #[test]
    fn keyed_builders_take_catalog_wording() {
        let cases = [
            (file_format_unsupported(), keys::FILE_FORMAT_UNSUPPORTED),
            (file_empty(), keys::FILE_EMPTY),
            (file_corrupted(), keys::FILE_CORRUPTED),
            (sensitive_data_detected(), keys::PRIVACY_SENSITIVE_DATA),
            (auth_token_missing(), keys::AUTH_TOKEN_MISSING),
            (analysis_auth_failed(), keys::AUTH_UNAUTHORIZED),
            (analysis_timeout(), keys::ANALYSIS_TIMEOUT),
            (column_detection_failed(), keys::COLUMN_TYPE_DETECTION_FAILED),
            (no_valid_columns(), keys::COLUMN_NO_VALID_COLUMNS),
            (network_error(), keys::NETWORK_CONNECTION_FAILED),
            (rate_limit_error(), keys::NETWORK_RATE_LIMIT),
        ];

        for (err, key) in cases {
            let preset = definitions::lookup(key).unwrap();
            assert_eq!(err.user_message(), preset.user_message, "{key}");
            assert_eq!(err.severity(), preset.severity, "{key}");
            assert_eq!(err.can_retry(), preset.can_retry, "{key}");
        }
    }

    #[test]
    fn worded_builders_use_their_codes() {
        let err = file_not_selected();
        assert_eq!(err.code(), ErrorCode::ValidationError);
        assert_eq!(err.context(), ErrorContext::FileUpload);

        let err = privacy_agreement_required();
        assert_eq!(err.code(), ErrorCode::PrivacyError);
        assert_eq!(err.severity(), ErrorSeverity::High);

        assert_eq!(insufficient_data().code(), ErrorCode::ValidationError);
        assert_eq!(no_variables_selected().user_message(), "No variables selected");
    }

    #[test]
    fn optional_contexts_default_sensibly() {
        assert_eq!(auth_error(None).context(), ErrorContext::Authentication);
        assert_eq!(
            auth_error(Some(ErrorContext::Analysis)).context(),
            ErrorContext::Analysis
        );
        assert_eq!(server_error(None).context(), ErrorContext::Network);
        assert!(server_error(None).can_retry());
    }

    #[test]
    fn optional_messages_fall_back() {
        let preset = definitions::lookup(keys::ANALYSIS_FAILED).unwrap();
        assert_eq!(analysis_failed(None).user_message(), preset.user_message);
        assert_eq!(analysis_failed(Some("R crashed")).user_message(), "R crashed");

        assert_eq!(invalid_data(None).user_message(), "Invalid data format");
        assert_eq!(invalid_data(Some("bad date")).user_message(), "bad date");
    }

    #[test]
    fn unknown_error_keeps_cause() {
        let err = unknown_error(
            Some(Arc::new(io::Error::new(io::ErrorKind::Other, "boom"))),
            Some("upload crashed"),
        );
        assert_eq!(err.code(), ErrorCode::UnknownError);
        assert_eq!(err.user_message(), "upload crashed");
        assert_eq!(err.stack(), Some("boom"));

        assert_eq!(unknown_error(None, None).user_message(), "An unknown error occurred");
    }

    #[test]
    fn macro_formats_custom_message() {
        let column = "age";
        let err = app_error!(
            ErrorCode::ColumnValidationFailed,
            ErrorContext::DataValidation,
            "column '{}' has no numeric values",
            column,
        );
        assert_eq!(err.message(), "column 'age' has no numeric values");
        assert_eq!(err.context(), ErrorContext::DataValidation);

        let err = app_error!(ErrorCode::NetworkError, ErrorContext::Network);
        assert_eq!(err.message(), "Network error");
    }
}
