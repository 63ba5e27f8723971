//! Error type definitions.
//!
//! Classified errors only: network-level probe failures are never errors in
//! this library (they surface as `status = 0` on the probe outcome), so the
//! enums here cover resource initialization, registrable-domain
//! classification, and inspection-level input problems.

use log::SetLoggerError;
use reqwest::Error as ReqwestError;
use thiserror::Error;

/// Error types for initialization failures.
#[derive(Error, Debug)]
pub enum InitializationError {
    /// Error initializing the logger.
    #[error("Logger initialization error: {0}")]
    LoggerError(#[from] SetLoggerError),

    /// Error initializing an HTTP probe client.
    #[error("HTTP client initialization error: {0}")]
    HttpClientError(#[from] ReqwestError),

    /// Error building the certificate verifier for a probe client.
    #[error("TLS verifier initialization error: {0}")]
    TlsVerifierError(String),
}

/// Error types for registrable-domain classification.
///
/// A host that cannot be reduced to a registrable (public-suffix) domain is
/// classified rather than treated as a generic failure, so callers can fall
/// back to exact host comparison where the contract allows it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// The host is an IP literal; IP addresses have no registrable domain.
    #[error("IP addresses do not have registrable domains: {0}")]
    IpAddress(String),

    /// The host has no registrable domain under the Public Suffix List
    /// (single-label hosts, bare suffixes).
    #[error("host has no registrable domain: {0}")]
    NotRegistrable(String),

    /// The host (or URL it came from) could not be parsed at all.
    #[error("unparseable host: {0}")]
    Unparseable(String),
}

/// Error types for a whole-domain inspection.
#[derive(Error, Debug)]
pub enum InspectError {
    /// The input domain is not a probe-able hostname.
    #[error("invalid inspection target: {0}")]
    InvalidDomain(#[from] DomainError),

    /// The inspection was cancelled before all four endpoints completed.
    #[error("inspection cancelled")]
    Cancelled,
}
