//! Structured log view of an [`AppError`].
//!
//! `ErrorLog` borrows from the error that created it and cannot outlive it.
//! Loggers consume it immediately, either through [`ErrorLog::emit`]
//! (`tracing` event with structured fields) or [`ErrorLog::write_to`]
//! (one line into any `fmt::Write`, every field bounded in length).
//!
//! The crate never installs a subscriber. Applications pick their own.

use crate::models::ErrorCause;
use crate::{AppError, ErrorCode, ErrorContext, ErrorSeverity};
use smallvec::SmallVec;
use std::borrow::Cow;
use std::fmt;

/// Maximum length for any individual field in formatted output.
pub const MAX_FIELD_OUTPUT_LEN: usize = 1024;

/// Truncation indicator appended to truncated strings.
pub const TRUNCATION_INDICATOR: &str = "...[TRUNCATED]";

/// Optional annotations rendered after the fixed fields.
///
/// Most errors carry two or three of these, so they stay inline.
pub type LogFields<'a> = SmallVec<[(&'static str, Cow<'a, str>); 6]>;

/// Borrowed log entry for one error.
#[derive(Debug)]
pub struct ErrorLog<'a> {
    code: ErrorCode,
    context: ErrorContext,
    severity: ErrorSeverity,
    retryable: bool,
    correlation_id: &'a str,
    message: &'a str,
    cause: Option<&'a ErrorCause>,
    fields: LogFields<'a>,
}

impl<'a> ErrorLog<'a> {
    pub fn new(err: &'a AppError) -> Self {
        let mut fields = LogFields::new();

        if let Some(meta) = err.metadata() {
            let known = [
                ("handler_context", meta.handler_context.as_deref()),
                ("component", meta.component.as_deref()),
                ("step", meta.step.as_deref()),
                ("file_name", meta.file_name.as_deref()),
                ("user_type", meta.user_type.as_deref()),
            ];
            for (key, value) in known {
                if let Some(value) = value {
                    fields.push((key, Cow::Borrowed(value)));
                }
            }
            if let Some(size) = meta.file_size {
                fields.push(("file_size", Cow::Owned(size.to_string())));
            }
        }

        if let Some(status) = err.details().and_then(|d| d.status) {
            fields.push(("status", Cow::Owned(status.to_string())));
        }

        Self {
            code: err.code(),
            context: err.context(),
            severity: err.severity(),
            retryable: err.can_retry(),
            correlation_id: err.correlation_id(),
            message: err.message(),
            cause: err.cause(),
            fields,
        }
    }

    #[inline]
    pub const fn code(&self) -> ErrorCode {
        self.code
    }

    #[inline]
    pub const fn context(&self) -> ErrorContext {
        self.context
    }

    #[inline]
    pub const fn severity(&self) -> ErrorSeverity {
        self.severity
    }

    #[inline]
    pub const fn is_retryable(&self) -> bool {
        self.retryable
    }

    #[inline]
    pub const fn correlation_id(&self) -> &str {
        self.correlation_id
    }

    #[inline]
    pub const fn message(&self) -> &str {
        self.message
    }

    #[inline]
    pub fn fields(&self) -> &[(&'static str, Cow<'a, str>)] {
        &self.fields
    }

    pub fn field(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find_map(|(k, v)| (*k == key).then_some(v.as_ref()))
    }

    /// Write one log line without intermediate allocation.
    ///
    /// Format: `[CODE] message correlation_id='..' context=.. severity=..`
    /// followed by `[RETRYABLE]`, `cause='..'` and the optional fields.
    /// Free-text fields are truncated to [`MAX_FIELD_OUTPUT_LEN`].
    pub fn write_to(&self, f: &mut impl fmt::Write) -> fmt::Result {
        write!(
            f,
            "[{}] {} correlation_id='{}' context={} severity={}",
            self.code,
            truncate_with_indicator(self.message),
            truncate_with_indicator(self.correlation_id),
            self.context,
            self.severity,
        )?;

        if self.retryable {
            f.write_str(" [RETRYABLE]")?;
        }

        if let Some(cause) = self.cause {
            write!(f, " cause='{}'", truncate_with_indicator(&cause.to_string()))?;
        }

        for (key, value) in &self.fields {
            write!(f, " {}='{}'", key, truncate_with_indicator(value))?;
        }

        Ok(())
    }

    /// Emit as a `tracing` event.
    ///
    /// Level follows severity: `High`/`Critical` at error, `Medium` at warn,
    /// `Low` at info.
    pub fn emit(&self) {
        let cause = self.cause.map(|c| c.to_string());
        let handler_context = self.field("handler_context");

        macro_rules! event {
            ($level:ident) => {
                tracing::$level!(
                    code = %self.code,
                    correlation_id = %self.correlation_id,
                    context = %self.context,
                    severity = %self.severity,
                    retryable = self.retryable,
                    cause = cause.as_deref(),
                    handler_context,
                    "[{}] {}",
                    self.code,
                    truncate_with_indicator(self.message),
                )
            };
        }

        match self.severity {
            ErrorSeverity::Critical | ErrorSeverity::High => event!(error),
            ErrorSeverity::Medium => event!(warn),
            ErrorSeverity::Low => event!(info),
        }
    }
}

impl fmt::Display for ErrorLog<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_to(f)
    }
}

/// Truncate a string for display.
///
/// Strings over [`MAX_FIELD_OUTPUT_LEN`] bytes are cut at a UTF-8 boundary
/// and end with [`TRUNCATION_INDICATOR`]; the result never exceeds the
/// limit. Returns a borrow when nothing was cut.
pub fn truncate_with_indicator(s: &str) -> Cow<'_, str> {
    if s.len() <= MAX_FIELD_OUTPUT_LEN {
        return Cow::Borrowed(s);
    }

    let max_content_len = MAX_FIELD_OUTPUT_LEN.saturating_sub(TRUNCATION_INDICATOR.len());

    let mut idx = max_content_len;
    while idx > 0 && !s.is_char_boundary(idx) {
        idx -= 1;
    }

    if idx == 0 {
        return Cow::Borrowed(TRUNCATION_INDICATOR);
    }

    let mut result = String::with_capacity(idx + TRUNCATION_INDICATOR.len());
    result.push_str(&s[..idx]);
    result.push_str(TRUNCATION_INDICATOR);
    Cow::Owned(result)
}
