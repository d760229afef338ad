//! HTTP status translation.
//!
//! Maps a failed backend response onto the error taxonomy. The status and
//! whatever body came back are always kept in `details` (`status`,
//! `responseData`) so the report carries the raw evidence.
//!
//! | Status | Code | Default context | Catalog key |
//! |---|---|---|---|
//! | 400 | `VALIDATION_ERROR` | `DATA_VALIDATION` | - |
//! | 401 | `AUTH_ERROR` | `AUTHENTICATION` | `auth.unauthorized` |
//! | 403 | `AUTH_ERROR` | `AUTHENTICATION` | - |
//! | 404 | `VALIDATION_ERROR` | `DATA_VALIDATION` | - |
//! | 409, 422 | `DATA_VALIDATION_FAILED` | `DATA_VALIDATION` | - |
//! | 429 | `RATE_LIMIT_ERROR` | `NETWORK` | `network.rate_limit` |
//! | 500-599 | `SERVER_ERROR` | `NETWORK` | `network.server_error` |
//! | other | `UNKNOWN_ERROR` | `NETWORK` | - |

use crate::definitions::keys;
use crate::models::{CreateOptions, ErrorDetails};
use crate::{create_error, AppError, ErrorCode, ErrorContext};
use serde_json::Value;

/// How one status bracket is translated.
struct StatusMapping {
    code: ErrorCode,
    context: ErrorContext,
    key: Option<&'static str>,
    message: Option<String>,
}

impl StatusMapping {
    const fn keyed(code: ErrorCode, context: ErrorContext, key: &'static str) -> Self {
        Self {
            code,
            context,
            key: Some(key),
            message: None,
        }
    }

    fn worded(code: ErrorCode, context: ErrorContext, message: impl Into<String>) -> Self {
        Self {
            code,
            context,
            key: None,
            message: Some(message.into()),
        }
    }
}

fn mapping_for(status: u16) -> StatusMapping {
    use ErrorCode::*;
    use ErrorContext::{Authentication, DataValidation, Network};

    match status {
        400 => StatusMapping::worded(
            ValidationError,
            DataValidation,
            "The request was malformed. Please check the data format.",
        ),
        401 => StatusMapping::keyed(AuthError, Authentication, keys::AUTH_UNAUTHORIZED),
        403 => StatusMapping::worded(
            AuthError,
            Authentication,
            "You do not have permission to access this resource.",
        ),
        404 => StatusMapping::worded(
            ValidationError,
            DataValidation,
            "The requested resource does not exist. Please check the URL.",
        ),
        409 => StatusMapping::worded(
            DataValidationFailed,
            DataValidation,
            "The data conflicts with the current state. It may have been submitted twice or changed meanwhile.",
        ),
        422 => StatusMapping::worded(
            DataValidationFailed,
            DataValidation,
            "Data validation failed. Please check the input format.",
        ),
        429 => StatusMapping::keyed(RateLimitError, Network, keys::NETWORK_RATE_LIMIT),
        500..=599 => StatusMapping {
            code: ServerError,
            context: Network,
            key: Some(keys::NETWORK_SERVER_ERROR),
            message: Some(format!("Server error ({status}). Please try again later.")),
        },
        _ => StatusMapping::worded(
            UnknownError,
            Network,
            format!("Unexpected HTTP error ({status})"),
        ),
    }
}

/// Translate a failed HTTP exchange into an [`AppError`].
///
/// `context` overrides the bracket's default context. `correlation_id`
/// is typically the request id the backend echoed back; an empty or missing
/// one gets a fresh id.
///
/// # Example
///
/// ```rust
/// use app_errors::{create_error_from_http, ErrorCode, ErrorContext};
///
/// let err = create_error_from_http(401, None, Some("req-7"), None);
/// assert_eq!(err.code(), ErrorCode::AuthError);
/// assert_eq!(err.context(), ErrorContext::Authentication);
/// assert_eq!(err.correlation_id(), "req-7");
/// assert_eq!(err.details().unwrap().status, Some(401));
/// ```
pub fn create_error_from_http(
    status: u16,
    context: Option<ErrorContext>,
    correlation_id: Option<&str>,
    response_data: Option<Value>,
) -> AppError {
    let mapping = mapping_for(status);

    let mut options = CreateOptions::new().details(ErrorDetails::http(status, response_data));
    options.correlation_id = correlation_id.map(str::to_string);
    options.custom_message = mapping.message;

    create_error(
        mapping.code,
        Some(context.unwrap_or(mapping.context)),
        mapping.key,
        options,
    )
}
