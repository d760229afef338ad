//! Reporter configuration.
//!
//! Three layers, later wins:
//!
//! 1. built-in defaults ([`ReporterConfig::default`])
//! 2. a TOML document ([`ReporterConfig::from_toml_str`])
//! 3. `APP_ERRORS_*` environment variables ([`ReporterConfig::apply_env`])
//!
//! | Variable | Field | Accepted values |
//! |---|---|---|
//! | `APP_ERRORS_ENABLED` | `enabled` | `1/0`, `true/false`, `yes/no`, `on/off` |
//! | `APP_ERRORS_ENDPOINT` | `endpoint` | non-empty path or absolute URL |
//! | `APP_ERRORS_BASE_URL` | `base_url` | `http://` or `https://` URL |
//! | `APP_ERRORS_BEACON_CAPACITY` | `beacon_capacity` | 1..=65536 |
//! | `APP_ERRORS_REQUEST_TIMEOUT_MS` | `request_timeout_ms` | 1..=600000 |
//! | `APP_ERRORS_KEEPALIVE` | `keepalive` | boolean, as above |
//!
//! Invalid environment values never abort parsing: each one is collected
//! as a [`ConfigError`] and the field keeps its previous value.

use crate::transport::MAX_BEACON_CAPACITY;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Prefix shared by every environment variable.
pub const ENV_PREFIX: &str = "APP_ERRORS_";

/// Collection endpoint used when nothing else is configured.
pub const DEFAULT_ENDPOINT: &str = "/api/report-error";

pub const DEFAULT_BASE_URL: &str = "http://localhost:3000";

const CAPACITY_RANGE: (u64, u64) = (1, MAX_BEACON_CAPACITY as u64);
const TIMEOUT_RANGE: (u64, u64) = (1, 600_000);

/// Configuration failures.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid TOML: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid value for {var}: expected {expected}, got '{value}'")]
    InvalidValue {
        var: String,
        expected: &'static str,
        value: String,
    },

    #[error("value out of range for {var}: {value} (valid: {min}..={max})")]
    OutOfRange {
        var: String,
        value: u64,
        min: u64,
        max: u64,
    },

    #[error("{field}: {reason}")]
    Invalid { field: &'static str, reason: &'static str },

    #[error("{} configuration problem(s), first: {}", .0.len(), .0.first().map(ToString::to_string).unwrap_or_default())]
    Multiple(Vec<ConfigError>),
}

impl ConfigError {
    fn collect(mut errors: Vec<ConfigError>) -> Option<Self> {
        match errors.len() {
            0 => None,
            1 => errors.pop(),
            _ => Some(Self::Multiple(errors)),
        }
    }
}

/// Settings for [`ErrorReporter::from_config`](crate::ErrorReporter::from_config).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReporterConfig {
    /// When false the reporter encodes nothing and sends nothing.
    pub enabled: bool,
    pub endpoint: String,
    pub base_url: String,
    /// Queue length of the primary beacon channel.
    pub beacon_capacity: usize,
    pub request_timeout_ms: u64,
    /// Keep-alive flag on fallback requests.
    pub keepalive: bool,
}

impl Default for ReporterConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            beacon_capacity: 64,
            request_timeout_ms: 5_000,
            keepalive: true,
        }
    }
}

impl ReporterConfig {
    /// Parse and validate a TOML document. Missing keys take defaults.
    ///
    /// ```rust
    /// use app_errors::ReporterConfig;
    ///
    /// let cfg = ReporterConfig::from_toml_str(r#"
    ///     endpoint = "/telemetry/errors"
    ///     beacon_capacity = 16
    /// "#).unwrap();
    /// assert_eq!(cfg.endpoint, "/telemetry/errors");
    /// assert!(cfg.keepalive);
    /// ```
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let cfg: Self = toml::from_str(text)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Defaults overlaid with the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut cfg = Self::default();
        if let Some(err) = ConfigError::collect(cfg.apply_env()) {
            return Err(err);
        }
        cfg.validate()?;
        Ok(cfg)
    }

    /// Overlay `APP_ERRORS_*` variables from the process environment.
    pub fn apply_env(&mut self) -> Vec<ConfigError> {
        self.apply_env_with(|name| std::env::var(name).ok())
    }

    /// Overlay variables from an arbitrary lookup.
    pub fn apply_env_with<F>(&mut self, lookup: F) -> Vec<ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut env = EnvParser::new(lookup);

        self.enabled = env.get_bool("ENABLED", self.enabled);
        self.endpoint = env.get_non_empty("ENDPOINT", &self.endpoint);
        self.base_url = env.get_url("BASE_URL", &self.base_url);
        self.beacon_capacity = env.get_u64_range(
            "BEACON_CAPACITY",
            self.beacon_capacity as u64,
            CAPACITY_RANGE,
        ) as usize;
        self.request_timeout_ms =
            env.get_u64_range("REQUEST_TIMEOUT_MS", self.request_timeout_ms, TIMEOUT_RANGE);
        self.keepalive = env.get_bool("KEEPALIVE", self.keepalive);

        env.errors
    }

    /// Check invariants that serde defaults cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();

        if self.endpoint.trim().is_empty() {
            errors.push(ConfigError::Invalid {
                field: "endpoint",
                reason: "must not be empty",
            });
        }
        if !is_http_url(&self.base_url) {
            errors.push(ConfigError::Invalid {
                field: "base_url",
                reason: "must start with http:// or https://",
            });
        }
        let capacity = self.beacon_capacity as u64;
        if capacity < CAPACITY_RANGE.0 || capacity > CAPACITY_RANGE.1 {
            errors.push(ConfigError::OutOfRange {
                var: "beacon_capacity".to_string(),
                value: capacity,
                min: CAPACITY_RANGE.0,
                max: CAPACITY_RANGE.1,
            });
        }
        if self.request_timeout_ms < TIMEOUT_RANGE.0 || self.request_timeout_ms > TIMEOUT_RANGE.1 {
            errors.push(ConfigError::OutOfRange {
                var: "request_timeout_ms".to_string(),
                value: self.request_timeout_ms,
                min: TIMEOUT_RANGE.0,
                max: TIMEOUT_RANGE.1,
            });
        }

        ConfigError::collect(errors).map_or(Ok(()), Err)
    }

    #[inline]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

fn is_http_url(s: &str) -> bool {
    s.starts_with("http://") || s.starts_with("https://")
}

// ============================================================================
// Environment Parsing
// ============================================================================

/// Typed `APP_ERRORS_*` reader that collects errors instead of failing fast.
struct EnvParser<F> {
    lookup: F,
    errors: Vec<ConfigError>,
}

impl<F> EnvParser<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn new(lookup: F) -> Self {
        Self {
            lookup,
            errors: Vec::new(),
        }
    }

    fn read(&self, name: &str) -> Option<(String, String)> {
        let var = format!("{ENV_PREFIX}{name}");
        (self.lookup)(&var).map(|value| (var, value))
    }

    fn get_bool(&mut self, name: &str, current: bool) -> bool {
        let Some((var, value)) = self.read(name) else {
            return current;
        };
        match value.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => true,
            "0" | "false" | "no" | "off" => false,
            _ => {
                self.errors.push(ConfigError::InvalidValue {
                    var,
                    expected: "boolean (true/false/1/0/yes/no/on/off)",
                    value,
                });
                current
            }
        }
    }

    fn get_non_empty(&mut self, name: &str, current: &str) -> String {
        match self.read(name) {
            Some((_, value)) if !value.trim().is_empty() => value,
            Some((var, value)) => {
                self.errors.push(ConfigError::InvalidValue {
                    var,
                    expected: "non-empty string",
                    value,
                });
                current.to_string()
            }
            None => current.to_string(),
        }
    }

    fn get_url(&mut self, name: &str, current: &str) -> String {
        match self.read(name) {
            Some((_, value)) if is_http_url(&value) => value,
            Some((var, value)) => {
                self.errors.push(ConfigError::InvalidValue {
                    var,
                    expected: "http:// or https:// URL",
                    value,
                });
                current.to_string()
            }
            None => current.to_string(),
        }
    }

    fn get_u64_range(&mut self, name: &str, current: u64, (min, max): (u64, u64)) -> u64 {
        let Some((var, value)) = self.read(name) else {
            return current;
        };
        match value.trim().parse::<u64>() {
            Ok(n) if (min..=max).contains(&n) => n,
            Ok(n) => {
                self.errors.push(ConfigError::OutOfRange {
                    var,
                    value: n,
                    min,
                    max,
                });
                current
            }
            Err(_) => {
                self.errors.push(ConfigError::InvalidValue {
                    var,
                    expected: "unsigned integer",
                    value,
                });
                current
            }
        }
    }
}
