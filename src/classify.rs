//! Classification of caught values.
//!
//! Failures reach the error layer in many shapes: an [`AppError`] that was
//! already normalized upstream, a native `std::error::Error`, a bare string
//! from a worker, a JSON body that *looks* like an error, or a panic
//! payload. [`Caught`] models all of them as one closed enum so every
//! operation here is a total `match`.
//!
//! # Operations
//!
//! - [`is_app_error`] / [`is_app_error_value`]: structural check
//! - [`extract_error_message`]: best human-readable text, never panics
//! - [`normalize`]: turn anything into an [`AppError`]
//!
//! # Example
//!
//! ```rust
//! use app_errors::{classify, Caught, ErrorCode};
//! use serde_json::json;
//!
//! let wire = json!({"code": "NETWORK_ERROR", "message": "x", "correlationId": "c-1"});
//! assert!(classify::is_app_error_value(&wire));
//!
//! let err = classify::normalize(Caught::from(wire));
//! assert_eq!(err.code(), ErrorCode::NetworkError);
//! assert_eq!(err.correlation_id(), "c-1");
//! ```

use crate::models::{CreateOptions, ErrorCause};
use crate::{create_error, AppError, ErrorCode, ErrorContext};
use serde_json::Value;
use std::any::Any;
use std::error::Error;
use std::fmt;
use std::sync::Arc;

/// Keys a JSON object must carry to count as an already-normalized error.
const REQUIRED_KEYS: [&str; 3] = ["code", "message", "correlationId"];

/// Fallback text for panic payloads that are neither `&str` nor `String`.
const OPAQUE_PANIC: &str = "panic with non-string payload";

// ============================================================================
// Caught Value
// ============================================================================

/// A value caught at an error boundary.
#[derive(Debug, Clone)]
pub enum Caught {
    /// Already normalized.
    App(AppError),
    /// A native error, possibly with its own `source()` chain.
    Native(ErrorCause),
    Text(String),
    Number(f64),
    Bool(bool),
    Null,
    Undefined,
    /// Structured JSON. Counts as an app error when it passes
    /// [`is_app_error_value`].
    Object(Value),
}

impl Caught {
    /// Wrap a native error. An [`AppError`] passed here stays an app error.
    pub fn native(err: impl Error + Send + Sync + 'static) -> Self {
        Self::from(Arc::new(err) as ErrorCause)
    }

    /// Convert a `catch_unwind` payload.
    pub fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        match payload.downcast::<String>() {
            Ok(s) => Self::Text(*s),
            Err(payload) => match payload.downcast_ref::<&'static str>() {
                Some(s) => Self::Text((*s).to_string()),
                None => Self::Text(OPAQUE_PANIC.to_string()),
            },
        }
    }

    /// Short name of the variant, logged by [`ErrorHandler`](crate::ErrorHandler).
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::App(_) => "app",
            Self::Native(_) => "native",
            Self::Text(_) => "text",
            Self::Number(_) => "number",
            Self::Bool(_) => "bool",
            Self::Null => "null",
            Self::Undefined => "undefined",
            Self::Object(_) => "object",
        }
    }
}

impl From<AppError> for Caught {
    fn from(err: AppError) -> Self {
        Self::App(err)
    }
}

impl From<ErrorCause> for Caught {
    fn from(err: ErrorCause) -> Self {
        match native_app_error(&err) {
            Some(app) => Self::App(app.clone()),
            None => Self::Native(err),
        }
    }
}

impl From<Box<dyn Error + Send + Sync>> for Caught {
    /// The shape errors take after `?` into a boxed error.
    fn from(err: Box<dyn Error + Send + Sync>) -> Self {
        match err.downcast::<AppError>() {
            Ok(app) => Self::App(*app),
            Err(err) => Self::Native(Arc::from(err)),
        }
    }
}

impl From<&str> for Caught {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for Caught {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<f64> for Caught {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<bool> for Caught {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl<T: Into<Caught>> From<Option<T>> for Caught {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Undefined, Into::into)
    }
}

impl From<Value> for Caught {
    /// Scalars map onto their own variants; arrays and objects stay JSON.
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(b),
            Value::Number(n) => Self::Number(n.as_f64().unwrap_or(f64::NAN)),
            Value::String(s) => Self::Text(s),
            other => Self::Object(other),
        }
    }
}

impl fmt::Display for Caught {
    /// String coercion of the caught value.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::App(err) => fmt::Display::fmt(err, f),
            Self::Native(err) => fmt::Display::fmt(err, f),
            Self::Text(s) => f.write_str(s),
            Self::Number(n) => write_number(*n, f),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Null => f.write_str("null"),
            Self::Undefined => f.write_str("undefined"),
            Self::Object(v) => write!(f, "{v}"),
        }
    }
}

/// Numbers render without a trailing `.0` and with spelled-out infinities.
fn write_number(n: f64, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if n.is_nan() {
        f.write_str("NaN")
    } else if n.is_infinite() {
        f.write_str(if n > 0.0 { "Infinity" } else { "-Infinity" })
    } else if n == 0.0 {
        f.write_str("0")
    } else {
        write!(f, "{n}")
    }
}

// ============================================================================
// Classification
// ============================================================================

/// Structural check on a raw JSON value.
///
/// True for objects carrying at least `code`, `message` and `correlationId`.
/// Values are not inspected.
#[inline]
pub fn is_app_error_value(value: &Value) -> bool {
    value
        .as_object()
        .is_some_and(|obj| REQUIRED_KEYS.iter().all(|k| obj.contains_key(*k)))
}

/// An [`AppError`] hiding behind a type-erased native error.
#[inline]
fn native_app_error(err: &ErrorCause) -> Option<&AppError> {
    err.downcast_ref::<AppError>()
}

/// Whether a caught value is already a normalized error.
///
/// Type-erased native errors count when they wrap an [`AppError`].
#[inline]
pub fn is_app_error(caught: &Caught) -> bool {
    match caught {
        Caught::App(_) => true,
        Caught::Native(err) => native_app_error(err).is_some(),
        Caught::Object(value) => is_app_error_value(value),
        _ => false,
    }
}

/// Best human-readable message for any caught value.
///
/// User message for app errors, `Display` for native errors, string
/// coercion for everything else.
pub fn extract_error_message(caught: &Caught) -> String {
    match caught {
        Caught::App(err) => err.user_message().to_string(),
        Caught::Native(err) => native_app_error(err)
            .map_or_else(|| err.to_string(), |app| app.user_message().to_string()),
        Caught::Object(value) if is_app_error_value(value) => value
            .get("userMessage")
            .and_then(Value::as_str)
            .or_else(|| value.get("message").and_then(Value::as_str))
            .map_or_else(|| value.to_string(), str::to_string),
        other => other.to_string(),
    }
}

/// Turn any caught value into an [`AppError`].
///
/// - app errors pass through unchanged (code and correlation id preserved),
///   including ones wrapped in a native error; a structural JSON error that does not fully deserialize is rebuilt
///   from the fields it does carry
/// - native errors become `UNKNOWN_ERROR` with the native message and the
///   error kept as cause
/// - everything else becomes `UNKNOWN_ERROR` with its string coercion as
///   message
pub fn normalize(caught: Caught) -> AppError {
    match caught {
        Caught::App(err) => err,
        Caught::Object(value) if is_app_error_value(&value) => from_wire(value),
        Caught::Native(err) => match native_app_error(&err) {
            Some(app) => app.clone(),
            None => create_error(
                ErrorCode::UnknownError,
                Some(ErrorContext::Unknown),
                None,
                CreateOptions::new()
                    .custom_message(err.to_string())
                    .shared_cause(err),
            ),
        },
        other => create_error(
            ErrorCode::UnknownError,
            Some(ErrorContext::Unknown),
            None,
            CreateOptions::new().custom_message(other.to_string()),
        ),
    }
}

fn from_wire(value: Value) -> AppError {
    match serde_json::from_value::<AppError>(value.clone()) {
        Ok(err) => err,
        Err(_) => rebuild(&value),
    }
}

/// Rebuild a partial wire error, keeping the identity fields it carries.
fn rebuild(value: &Value) -> AppError {
    let text = |key: &str| value.get(key).and_then(Value::as_str);

    let code = text("code")
        .and_then(|c| c.parse().ok())
        .unwrap_or(ErrorCode::UnknownError);
    let context = text("context").and_then(|c| c.parse().ok());

    let mut options = CreateOptions::new();
    options.custom_message = text("userMessage").or(text("message")).map(str::to_string);
    options.correlation_id = match value.get("correlationId") {
        Some(Value::String(id)) => Some(id.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    };

    create_error(code, context, None, options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convenience;
    use serde_json::json;
    use std::io;

    #[test]
    fn app_errors_are_recognized() {
        assert!(is_app_error(&Caught::from(convenience::file_empty())));

        let wire = serde_json::to_value(convenience::network_error()).unwrap();
        assert!(is_app_error(&Caught::Object(wire)));
    }

    fn fail_upload(err: AppError) -> Result<(), Box<dyn Error + Send + Sync>> {
        let checked: Result<(), AppError> = Err(err);
        checked?;
        Ok(())
    }

    #[test]
    fn boxed_app_errors_keep_identity() {
        let original = convenience::file_size_exceeded(15_728_640, 10_485_760);
        let Err(boxed) = fail_upload(original.clone()) else {
            unreachable!("upload must fail");
        };

        let caught = Caught::from(boxed);
        assert_eq!(caught.kind(), "app");
        let out = normalize(caught);
        assert_eq!(out.code(), ErrorCode::FileSizeExceeded);
        assert_eq!(out.correlation_id(), original.correlation_id());
    }

    #[test]
    fn shared_app_errors_keep_identity() {
        let original = convenience::network_error();
        let Err(boxed) = fail_upload(original.clone()) else {
            unreachable!("upload must fail");
        };
        let shared: ErrorCause = Arc::from(boxed);

        // Built directly, bypassing the `From` conversions.
        let raw = Caught::Native(Arc::clone(&shared));
        assert!(is_app_error(&raw));
        assert_eq!(extract_error_message(&raw), original.user_message());
        let out = normalize(raw);
        assert_eq!(out.code(), ErrorCode::NetworkError);
        assert_eq!(out.correlation_id(), original.correlation_id());
        assert!(out.cause().is_none());

        assert!(matches!(Caught::from(shared), Caught::App(_)));
        assert!(matches!(Caught::native(original), Caught::App(_)));
    }

    #[test]
    fn kinds_name_the_variant() {
        assert_eq!(Caught::from("x").kind(), "text");
        assert_eq!(Caught::Number(1.0).kind(), "number");
        assert_eq!(Caught::native(io::Error::other("x")).kind(), "native");
        assert_eq!(Caught::from(json!({"a": 1})).kind(), "object");
        assert_eq!(Caught::from(None::<bool>).kind(), "undefined");
    }

    #[test]
    fn partial_objects_are_not_app_errors() {
        for value in [
            json!({"code": "X", "message": "m"}),
            json!({"message": "m", "correlationId": "c"}),
            json!([1, 2, 3]),
            json!({}),
        ] {
            assert!(!is_app_error_value(&value), "{value}");
        }
        assert!(!is_app_error(&Caught::from("boom")));
        assert!(!is_app_error(&Caught::native(io::Error::other("x"))));
        assert!(!is_app_error(&Caught::Null));
        assert!(!is_app_error(&Caught::Undefined));
    }

    #[test]
    fn extraction_prefers_user_message() {
        let err = convenience::file_not_selected();
        let expected = err.user_message().to_string();
        assert_eq!(extract_error_message(&Caught::from(err)), expected);

        let wire = json!({"code": "A", "message": "dev", "userMessage": "user", "correlationId": "c"});
        assert_eq!(extract_error_message(&Caught::Object(wire)), "user");

        let wire = json!({"code": "A", "message": "dev", "correlationId": "c"});
        assert_eq!(extract_error_message(&Caught::Object(wire)), "dev");
    }

    #[test]
    fn extraction_coerces_everything_else() {
        assert_eq!(extract_error_message(&Caught::native(io::Error::other("disk full"))), "disk full");
        assert_eq!(extract_error_message(&Caught::from("plain")), "plain");
        assert_eq!(extract_error_message(&Caught::Number(42.0)), "42");
        assert_eq!(extract_error_message(&Caught::Number(1.5)), "1.5");
        assert_eq!(extract_error_message(&Caught::Number(f64::NAN)), "NaN");
        assert_eq!(extract_error_message(&Caught::Number(f64::NEG_INFINITY)), "-Infinity");
        assert_eq!(extract_error_message(&Caught::Number(-0.0)), "0");
        assert_eq!(extract_error_message(&Caught::Bool(false)), "false");
        assert_eq!(extract_error_message(&Caught::Null), "null");
        assert_eq!(extract_error_message(&Caught::Undefined), "undefined");
        assert_eq!(extract_error_message(&Caught::Object(json!({"a": 1}))), r#"{"a":1}"#);
    }

    #[test]
    fn normalize_passes_app_errors_through() {
        let original = convenience::rate_limit_error();
        let id = original.correlation_id().to_string();
        let out = normalize(Caught::from(original));
        assert_eq!(out.code(), ErrorCode::RateLimitError);
        assert_eq!(out.correlation_id(), id);
    }

    #[test]
    fn normalize_deserializes_full_wire_errors() {
        let original = convenience::server_error(None);
        let wire = serde_json::to_value(&original).unwrap();
        let out = normalize(Caught::Object(wire));

        assert_eq!(out.code(), original.code());
        assert_eq!(out.correlation_id(), original.correlation_id());
        assert_eq!(out.user_message(), original.user_message());
        assert_eq!(out.timestamp(), original.timestamp());
    }

    #[test]
    fn normalize_rebuilds_partial_wire_errors() {
        let wire = json!({"code": "AUTH_TOKEN_MISSING", "message": "no token", "correlationId": "abc"});
        let out = normalize(Caught::from(wire));
        assert_eq!(out.code(), ErrorCode::AuthTokenMissing);
        assert_eq!(out.correlation_id(), "abc");
        assert_eq!(out.user_message(), "no token");

        let wire = json!({"code": "SOMETHING_ELSE", "message": "?", "correlationId": 7});
        let out = normalize(Caught::from(wire));
        assert_eq!(out.code(), ErrorCode::UnknownError);
        assert_eq!(out.correlation_id(), "7");
    }

    #[test]
    fn normalize_wraps_native_errors_with_cause() {
        let out = normalize(Caught::native(io::Error::other("socket hung up")));
        assert_eq!(out.code(), ErrorCode::UnknownError);
        assert_eq!(out.context(), ErrorContext::Unknown);
        assert_eq!(out.user_message(), "socket hung up");
        assert!(out.cause().is_some());
        assert_eq!(out.stack(), Some("socket hung up"));
    }

    #[test]
    fn normalize_coerces_primitives() {
        let out = normalize(Caught::from("worker died"));
        assert_eq!(out.user_message(), "worker died");
        assert!(out.cause().is_none());

        let out = normalize(Caught::Number(404.0));
        assert_eq!(out.user_message(), "404");
    }

    #[test]
    fn json_scalars_map_to_variants() {
        assert!(matches!(Caught::from(json!(null)), Caught::Null));
        assert!(matches!(Caught::from(json!(true)), Caught::Bool(true)));
        assert!(matches!(Caught::from(json!("s")), Caught::Text(_)));
        assert!(matches!(Caught::from(json!(3)), Caught::Number(n) if n == 3.0));
        assert!(matches!(Caught::from(json!([1])), Caught::Object(_)));
        assert!(matches!(Caught::from(None::<String>), Caught::Undefined));
    }

    #[test]
    fn panic_payloads_become_text() {
        let payload = std::panic::catch_unwind(|| panic!("exploded {}", 1)).unwrap_err();
        assert!(matches!(Caught::from_panic(payload), Caught::Text(s) if s == "exploded 1"));

        let payload = std::panic::catch_unwind(|| panic!("static")).unwrap_err();
        assert!(matches!(Caught::from_panic(payload), Caught::Text(s) if s == "static"));

        let payload = std::panic::catch_unwind(|| std::panic::panic_any(5_u8)).unwrap_err();
        assert_eq!(Caught::from_panic(payload).to_string(), OPAQUE_PANIC);
    }
}
