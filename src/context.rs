//! Fluent construction over [`create_error`](crate::create_error).
//!
//! `ErrorBuilder` is for call sites that assemble an error step by step
//! (add a detail here, a metadata key there) instead of filling a
//! [`CreateOptions`] in one go. It adds no semantics of its own: `build`
//! hands everything to the factory, so the resolution order is identical.
//!
//! # Example
//!
//! ```rust
//! use app_errors::{definitions::keys, ErrorBuilder, ErrorCode, ErrorContext};
//!
//! let err = ErrorBuilder::new(ErrorCode::AnalysisError)
//!     .context(ErrorContext::Analysis)
//!     .message_key(keys::ANALYSIS_FAILED)
//!     .detail("variables", 3)
//!     .component("ResultsTable")
//!     .build();
//!
//! assert_eq!(err.context(), ErrorContext::Analysis);
//! assert!(err.can_retry());
//! ```

use crate::factory::ErrorFactory;
use crate::models::{CreateOptions, ErrorCause, ErrorDetails, ErrorMetadata};
use crate::{AppError, ErrorCode, ErrorContext};
use serde_json::Value;
use std::error::Error;
use std::sync::Arc;

/// Step-by-step builder for an [`AppError`].
#[derive(Debug, Clone)]
#[must_use = "builders do nothing until `build` is called"]
pub struct ErrorBuilder {
    code: ErrorCode,
    context: Option<ErrorContext>,
    message_key: Option<&'static str>,
    options: CreateOptions,
    factory: Option<ErrorFactory>,
}

impl ErrorBuilder {
    #[inline]
    pub fn new(code: ErrorCode) -> Self {
        Self {
            code,
            context: None,
            message_key: None,
            options: CreateOptions::default(),
            factory: None,
        }
    }

    #[inline]
    pub fn context(mut self, context: ErrorContext) -> Self {
        self.context = Some(context);
        self
    }

    /// Catalog key to resolve wording from.
    ///
    /// # Panics (Debug Mode)
    ///
    /// Panics if a key was already set. Two keys on one error is always a
    /// call-site mistake.
    #[inline]
    pub fn message_key(mut self, key: &'static str) -> Self {
        debug_assert!(
            self.message_key.is_none(),
            "ErrorBuilder: message key already set (attempted overwrite with '{key}')"
        );
        self.message_key = Some(key);
        self
    }

    #[inline]
    pub fn custom_message(mut self, message: impl Into<String>) -> Self {
        self.options.custom_message = Some(message.into());
        self
    }

    #[inline]
    pub fn correlation_id(mut self, id: impl Into<String>) -> Self {
        self.options.correlation_id = Some(id.into());
        self
    }

    #[inline]
    pub fn cause(mut self, cause: impl Error + Send + Sync + 'static) -> Self {
        self.options.cause = Some(Arc::new(cause));
        self
    }

    #[inline]
    pub fn shared_cause(mut self, cause: ErrorCause) -> Self {
        self.options.cause = Some(cause);
        self
    }

    /// Replace the details payload wholesale.
    #[inline]
    pub fn details(mut self, details: ErrorDetails) -> Self {
        self.options.details = Some(details);
        self
    }

    /// Add one extra detail key.
    #[inline]
    pub fn detail(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.details_mut().extra.insert(key.into(), value.into());
        self
    }

    #[inline]
    pub fn status(mut self, status: u16) -> Self {
        self.details_mut().status = Some(status);
        self
    }

    /// Replace the metadata wholesale.
    #[inline]
    pub fn metadata(mut self, metadata: ErrorMetadata) -> Self {
        self.options.metadata = Some(metadata);
        self
    }

    /// Add one extra metadata key.
    #[inline]
    pub fn meta(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata_mut().extra.insert(key.into(), value.into());
        self
    }

    #[inline]
    pub fn component(mut self, component: impl Into<String>) -> Self {
        self.metadata_mut().component = Some(component.into());
        self
    }

    #[inline]
    pub fn step(mut self, step: impl Into<String>) -> Self {
        self.metadata_mut().step = Some(step.into());
        self
    }

    /// Build through a specific factory instead of the process default.
    #[inline]
    pub fn factory(mut self, factory: ErrorFactory) -> Self {
        self.factory = Some(factory);
        self
    }

    /// Build the final `AppError`. Never fails.
    #[inline]
    pub fn build(self) -> AppError {
        let factory = self.factory.unwrap_or_default();
        factory.create(self.code, self.context, self.message_key, self.options)
    }

    fn details_mut(&mut self) -> &mut ErrorDetails {
        self.options.details.get_or_insert_with(ErrorDetails::default)
    }

    fn metadata_mut(&mut self) -> &mut ErrorMetadata {
        self.options.metadata.get_or_insert_with(ErrorMetadata::default)
    }
}

impl From<ErrorCode> for ErrorBuilder {
    fn from(code: ErrorCode) -> Self {
        Self::new(code)
    }
}

// ============================================================================
// Tests
// ============================================================================
