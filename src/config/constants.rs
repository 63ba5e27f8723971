//! Configuration constants.
//!
//! This module defines all configuration constants used throughout the
//! library, including timeouts, redirect limits, and HSTS thresholds.

// Network operation timeouts
/// Per-probe HTTP request timeout in seconds.
/// Covers connect, TLS handshake, and response headers for a single probe.
/// A timed-out probe is reported as unreachable (status 0), never as an error.
pub const PROBE_TIMEOUT_SECS: u64 = 10;
/// TCP connection timeout in seconds.
/// Shorter than the overall probe timeout so dead hosts fail fast.
pub const TCP_CONNECT_TIMEOUT_SECS: u64 = 5;

/// Default User-Agent string for probe requests.
///
/// Users can override this via `InspectionConfig::user_agent`. A mainstream
/// browser string is used because some sites serve different redirect chains
/// (or block outright) for non-browser agents, which would skew the
/// canonicalization verdict.
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

// Redirect handling
/// Maximum number of redirect hops to follow when resolving an eventual
/// redirect target. Prevents infinite redirect loops and excessive chains.
pub const MAX_REDIRECT_HOPS: usize = 10;

// HSTS policy thresholds
/// Minimum `max-age` (in seconds) required for HSTS preload readiness.
/// One year, per the browser preload list submission requirements.
pub const HSTS_PRELOAD_MIN_AGE_SECS: i64 = 31_536_000;

// Probe target ports
/// Default port for HTTP probes.
pub const DEFAULT_HTTP_PORT: u16 = 80;
/// Default port for HTTPS probes.
pub const DEFAULT_HTTPS_PORT: u16 = 443;
