//! Configuration types.
//!
//! This module defines the enums and structs used to configure an
//! inspection run and the logger.

use std::collections::HashMap;
use std::net::IpAddr;

use crate::config::constants::{
    DEFAULT_HTTPS_PORT, DEFAULT_HTTP_PORT, DEFAULT_USER_AGENT, PROBE_TIMEOUT_SECS,
};

/// Logging level for the library's log output.
///
/// Controls the verbosity of log output, from most restrictive (Error) to
/// most verbose (Trace).
#[derive(Clone, Debug)]
pub enum LogLevel {
    /// Only error messages
    Error,
    /// Error and warning messages
    Warn,
    /// Error, warning, and informational messages
    Info,
    /// All messages except trace
    Debug,
    /// All messages including trace
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(l: LogLevel) -> Self {
        match l {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Log output format.
///
/// Controls how log messages are formatted:
/// - `Plain`: Human-readable format with colors (default)
/// - `Json`: Structured JSON format for machine parsing
#[derive(Clone, Debug)]
pub enum LogFormat {
    /// Human-readable format with colors (default)
    Plain,
    /// Structured JSON format for machine parsing
    Json,
}

/// Inspection configuration (no CLI dependencies).
///
/// Constructed programmatically by the embedding application. The probe
/// ports and DNS overrides exist so lab and test environments can route
/// probes at local servers without touching real DNS; production callers
/// leave them at their defaults.
///
/// # Examples
///
/// ```no_run
/// use domain_posture::InspectionConfig;
///
/// let config = InspectionConfig {
///     timeout_seconds: 5,
///     ..Default::default()
/// };
/// ```
#[derive(Debug, Clone)]
pub struct InspectionConfig {
    /// Per-probe timeout in seconds
    pub timeout_seconds: u64,

    /// HTTP User-Agent header value sent with every probe
    pub user_agent: String,

    /// Port probed for HTTP endpoints (default 80)
    pub http_port: u16,

    /// Port probed for HTTPS endpoints (default 443)
    pub https_port: u16,

    /// Static hostname-to-address overrides applied to every probe client.
    /// The URL's port is preserved; only address resolution is overridden.
    pub dns_overrides: HashMap<String, IpAddr>,
}

impl Default for InspectionConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: PROBE_TIMEOUT_SECS,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            http_port: DEFAULT_HTTP_PORT,
            https_port: DEFAULT_HTTPS_PORT,
            dns_overrides: HashMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_conversion() {
        assert_eq!(
            log::LevelFilter::from(LogLevel::Error),
            log::LevelFilter::Error
        );
        assert_eq!(
            log::LevelFilter::from(LogLevel::Warn),
            log::LevelFilter::Warn
        );
        assert_eq!(
            log::LevelFilter::from(LogLevel::Info),
            log::LevelFilter::Info
        );
        assert_eq!(
            log::LevelFilter::from(LogLevel::Debug),
            log::LevelFilter::Debug
        );
        assert_eq!(
            log::LevelFilter::from(LogLevel::Trace),
            log::LevelFilter::Trace
        );
    }

    #[test]
    fn test_config_default() {
        let config = InspectionConfig::default();
        assert_eq!(config.timeout_seconds, PROBE_TIMEOUT_SECS);
        assert_eq!(config.http_port, 80);
        assert_eq!(config.https_port, 443);
        assert!(config.dns_overrides.is_empty());
        assert_eq!(config.user_agent, DEFAULT_USER_AGENT);
    }
}
