//! Value types carried by an [`AppError`](crate::AppError).
//!
//! # Architecture
//!
//! - `ErrorDetails`: structured payload describing *what* went wrong
//!   (HTTP status, offending sizes, backend response body)
//! - `ErrorMetadata`: cross-cutting annotations describing *where* it went
//!   wrong (file, step, component, handler)
//! - `CreateOptions`: the optional overrides accepted by the factory
//!
//! Both payload types have a handful of well-known keys plus an open map of
//! extra JSON keys, flattened on the wire. The factory never interprets
//! either one.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::error::Error;
use std::sync::Arc;

/// Shared handle to an underlying native error.
pub type ErrorCause = Arc<dyn Error + Send + Sync + 'static>;

// ============================================================================
// Error Details
// ============================================================================

/// Free-form error payload with typed access to the common keys.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorDetails {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual_size: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_size: Option<u64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ErrorDetails {
    pub fn new() -> Self {
        Self::default()
    }

    /// Details for an HTTP failure.
    pub fn http(status: u16, response_data: Option<Value>) -> Self {
        Self {
            status: Some(status),
            response_data,
            ..Self::default()
        }
    }

    /// Details for a size-limit violation.
    pub fn size(actual_size: u64, max_size: u64) -> Self {
        Self {
            actual_size: Some(actual_size),
            max_size: Some(max_size),
            ..Self::default()
        }
    }

    /// Attach an extra key. Well-known keys should use the typed fields.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.extra.get(key)
    }
}

// ============================================================================
// Error Metadata
// ============================================================================

/// Annotations attached by callers and handler layers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_size: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub component: Option<String>,
    /// Set by [`ErrorHandler`](crate::ErrorHandler) when it handles the error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub handler_context: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ErrorMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn component(mut self, component: impl Into<String>) -> Self {
        self.component = Some(component.into());
        self
    }

    pub fn step(mut self, step: impl Into<String>) -> Self {
        self.step = Some(step.into());
        self
    }

    pub fn file(mut self, name: impl Into<String>, size: u64) -> Self {
        self.file_name = Some(name.into());
        self.file_size = Some(size);
        self
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.extra.get(key)
    }
}

// ============================================================================
// Factory Options
// ============================================================================

/// Optional overrides for [`create_error`](crate::create_error).
///
/// Empty strings in `custom_message` and `correlation_id` are treated as
/// absent, so a blank override never hides a catalog message or suppresses
/// id generation.
#[derive(Debug, Clone, Default)]
pub struct CreateOptions {
    pub custom_message: Option<String>,
    pub details: Option<ErrorDetails>,
    pub cause: Option<ErrorCause>,
    pub correlation_id: Option<String>,
    pub metadata: Option<ErrorMetadata>,
}

impl CreateOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn custom_message(mut self, message: impl Into<String>) -> Self {
        self.custom_message = Some(message.into());
        self
    }

    pub fn details(mut self, details: ErrorDetails) -> Self {
        self.details = Some(details);
        self
    }

    pub fn cause(mut self, cause: impl Error + Send + Sync + 'static) -> Self {
        self.cause = Some(Arc::new(cause));
        self
    }

    pub fn shared_cause(mut self, cause: ErrorCause) -> Self {
        self.cause = Some(cause);
        self
    }

    pub fn correlation_id(mut self, id: impl Into<String>) -> Self {
        self.correlation_id = Some(id.into());
        self
    }

    pub fn metadata(mut self, metadata: ErrorMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Custom message, if present and non-empty.
    pub(crate) fn effective_message(&self) -> Option<&str> {
        self.custom_message.as_deref().filter(|m| !m.is_empty())
    }

    /// Correlation id, if present and non-empty.
    pub(crate) fn effective_correlation_id(&self) -> Option<&str> {
        self.correlation_id.as_deref().filter(|id| !id.is_empty())
    }
}

// ============================================================================
// Tests
// ============================================================================
