//! Error code taxonomy - the closed set of error kinds, functional areas and
//! severity levels every [`AppError`](crate::AppError) is built from.
//!
//! # Namespace Structure
//!
//! Codes are grouped by family. Each family has a root code (`FILE_ERROR`,
//! `AUTH_ERROR`, ...) and zero or more specific sub-kinds:
//!
//! - **FILE**: upload and parsing of user data files
//! - **VALIDATION**: data and column validation
//! - **PRIVACY**: sensitive data checks and privacy agreement
//! - **AUTH**: authentication tokens and authorization
//! - **ANALYSIS**: backend statistics and column profiling
//! - **NETWORK**: transport, server and rate limiting
//! - **UNKNOWN**: everything that could not be classified
//!
//! # Governance
//!
//! The wire names (`SCREAMING_SNAKE_CASE`) are part of the reporting contract
//! with the collection endpoint and must never change. Adding a code means
//! extending the enum and every `match` in `factory`; the compiler enforces
//! the second half.
//!
//! # Example
//!
//! ```rust
//! use app_errors::{ErrorCode, ErrorFamily};
//!
//! let code: ErrorCode = "FILE_SIZE_EXCEEDED".parse().unwrap();
//! assert_eq!(code, ErrorCode::FileSizeExceeded);
//! assert_eq!(code.family(), ErrorFamily::File);
//! assert_eq!(code.to_string(), "FILE_SIZE_EXCEEDED");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

// ============================================================================
// Error Code (Primary Identity Type)
// ============================================================================

/// Symbolic error kind. Stable, finite set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    FileError,
    FileSizeExceeded,
    FileFormatUnsupported,
    FileCorrupted,
    FileEmpty,

    ValidationError,
    DataValidationFailed,
    ColumnValidationFailed,

    PrivacyError,
    SensitiveDataDetected,
    PrivacyAgreementRequired,

    AuthError,
    AuthTokenMissing,
    AuthTokenInvalid,

    AnalysisError,
    AnalysisTimeout,
    AnalysisAuthFailed,
    ColumnTypeDetectionFailed,

    NetworkError,
    ServerError,
    RateLimitError,

    UnknownError,
}

impl ErrorCode {
    /// Every code, in declaration order.
    pub const ALL: [ErrorCode; 22] = [
        Self::FileError,
        Self::FileSizeExceeded,
        Self::FileFormatUnsupported,
        Self::FileCorrupted,
        Self::FileEmpty,
        Self::ValidationError,
        Self::DataValidationFailed,
        Self::ColumnValidationFailed,
        Self::PrivacyError,
        Self::SensitiveDataDetected,
        Self::PrivacyAgreementRequired,
        Self::AuthError,
        Self::AuthTokenMissing,
        Self::AuthTokenInvalid,
        Self::AnalysisError,
        Self::AnalysisTimeout,
        Self::AnalysisAuthFailed,
        Self::ColumnTypeDetectionFailed,
        Self::NetworkError,
        Self::ServerError,
        Self::RateLimitError,
        Self::UnknownError,
    ];

    /// Wire name of this code. Zero allocation.
    #[inline]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::FileError => "FILE_ERROR",
            Self::FileSizeExceeded => "FILE_SIZE_EXCEEDED",
            Self::FileFormatUnsupported => "FILE_FORMAT_UNSUPPORTED",
            Self::FileCorrupted => "FILE_CORRUPTED",
            Self::FileEmpty => "FILE_EMPTY",
            Self::ValidationError => "VALIDATION_ERROR",
            Self::DataValidationFailed => "DATA_VALIDATION_FAILED",
            Self::ColumnValidationFailed => "COLUMN_VALIDATION_FAILED",
            Self::PrivacyError => "PRIVACY_ERROR",
            Self::SensitiveDataDetected => "SENSITIVE_DATA_DETECTED",
            Self::PrivacyAgreementRequired => "PRIVACY_AGREEMENT_REQUIRED",
            Self::AuthError => "AUTH_ERROR",
            Self::AuthTokenMissing => "AUTH_TOKEN_MISSING",
            Self::AuthTokenInvalid => "AUTH_TOKEN_INVALID",
            Self::AnalysisError => "ANALYSIS_ERROR",
            Self::AnalysisTimeout => "ANALYSIS_TIMEOUT",
            Self::AnalysisAuthFailed => "ANALYSIS_AUTH_FAILED",
            Self::ColumnTypeDetectionFailed => "COLUMN_TYPE_DETECTION_FAILED",
            Self::NetworkError => "NETWORK_ERROR",
            Self::ServerError => "SERVER_ERROR",
            Self::RateLimitError => "RATE_LIMIT_ERROR",
            Self::UnknownError => "UNKNOWN_ERROR",
        }
    }

    /// Family this code belongs to.
    #[inline]
    pub const fn family(self) -> ErrorFamily {
        match self {
            Self::FileError
            | Self::FileSizeExceeded
            | Self::FileFormatUnsupported
            | Self::FileCorrupted
            | Self::FileEmpty => ErrorFamily::File,
            Self::ValidationError | Self::DataValidationFailed | Self::ColumnValidationFailed => {
                ErrorFamily::Validation
            }
            Self::PrivacyError | Self::SensitiveDataDetected | Self::PrivacyAgreementRequired => {
                ErrorFamily::Privacy
            }
            Self::AuthError | Self::AuthTokenMissing | Self::AuthTokenInvalid => ErrorFamily::Auth,
            Self::AnalysisError
            | Self::AnalysisTimeout
            | Self::AnalysisAuthFailed
            | Self::ColumnTypeDetectionFailed => ErrorFamily::Analysis,
            Self::NetworkError | Self::ServerError | Self::RateLimitError => ErrorFamily::Network,
            Self::UnknownError => ErrorFamily::Unknown,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a wire name does not match any known code, context or severity.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind} '{value}'")]
pub struct ParseCodeError {
    kind: &'static str,
    value: String,
}

impl FromStr for ErrorCode {
    type Err = ParseCodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|code| code.as_str() == s)
            .ok_or_else(|| ParseCodeError {
                kind: "error code",
                value: s.to_string(),
            })
    }
}

/// Coarse grouping of codes, used for filtering and dashboards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorFamily {
    File,
    Validation,
    Privacy,
    Auth,
    Analysis,
    Network,
    Unknown,
}

// ============================================================================
// Error Context
// ============================================================================

/// Functional area in which an error arose.
///
/// Used for filtering and telemetry only, never for control flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorContext {
    FileUpload,
    FileProcessing,
    DataValidation,
    PrivacyCheck,
    Authentication,
    Analysis,
    Network,
    #[default]
    Unknown,
}

impl ErrorContext {
    /// Every context, in declaration order.
    pub const ALL: [ErrorContext; 8] = [
        Self::FileUpload,
        Self::FileProcessing,
        Self::DataValidation,
        Self::PrivacyCheck,
        Self::Authentication,
        Self::Analysis,
        Self::Network,
        Self::Unknown,
    ];

    #[inline]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::FileUpload => "FILE_UPLOAD",
            Self::FileProcessing => "FILE_PROCESSING",
            Self::DataValidation => "DATA_VALIDATION",
            Self::PrivacyCheck => "PRIVACY_CHECK",
            Self::Authentication => "AUTHENTICATION",
            Self::Analysis => "ANALYSIS",
            Self::Network => "NETWORK",
            Self::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ErrorContext {
    type Err = ParseCodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|ctx| ctx.as_str() == s)
            .ok_or_else(|| ParseCodeError {
                kind: "error context",
                value: s.to_string(),
            })
    }
}

// ============================================================================
// Severity
// ============================================================================

/// Ordinal severity driving UI treatment.
///
/// Ordering follows declaration order, so `Low < Medium < High < Critical`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl ErrorSeverity {
    #[inline]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
            Self::Critical => "CRITICAL",
        }
    }

    /// Whether a notification at this severity may dismiss itself.
    ///
    /// Everything above `Low` stays until the user acts on it.
    #[inline]
    pub const fn auto_dismiss(self) -> bool {
        matches!(self, Self::Low)
    }
}

impl fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ErrorSeverity {
    type Err = ParseCodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "LOW" => Ok(Self::Low),
            "MEDIUM" => Ok(Self::Medium),
            "HIGH" => Ok(Self::High),
            "CRITICAL" => Ok(Self::Critical),
            other => Err(ParseCodeError {
                kind: "severity",
                value: other.to_string(),
            }),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
