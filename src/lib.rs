//! domain_posture library: canonical web identity and HTTPS posture
//!
//! This library determines, for a given internet domain, its canonical web
//! identity and HTTPS-compliance posture. It probes the domain's four
//! endpoint combinations (HTTP/HTTPS crossed with root/www), classifies
//! each endpoint's TLS and redirect behavior, and combines the four
//! observations into domain-level verdicts: canonical protocol and
//! subdomain, HTTPS support and enforcement, downgrade detection, HSTS
//! scope and preload readiness, and redirect-domain summary.
//!
//! # Example
//!
//! ```no_run
//! use domain_posture::{InspectionConfig, Inspector};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let inspector = Inspector::new(InspectionConfig::default())?;
//! let inspection = inspector.inspect("example.org").await?;
//!
//! println!(
//!     "canonical: {} (enforces HTTPS: {})",
//!     inspection.verdict.canonical_url, inspection.verdict.enforce_https
//! );
//! # Ok(())
//! # }
//! ```
//!
//! # Requirements
//!
//! This library requires a Tokio runtime. Use `#[tokio::main]` in your
//! application or ensure you're calling library functions within an async
//! context.

#![warn(missing_docs)]

mod canonical;
mod config;
mod domain;
mod endpoint;
mod error_handling;
mod evaluate;
mod hsts;
pub mod initialization;
mod probe;
mod redirect;
mod tls;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use serde::Serialize;
use tokio_util::sync::CancellationToken;

// Re-export public API
pub use canonical::{canonicalize, DomainVerdict};
pub use config::{InspectionConfig, LogFormat, LogLevel};
pub use domain::{registrable_domain, same_site};
pub use endpoint::{EndpointKey, EndpointRecord, EndpointRecords, Protocol, Subdomain};
pub use error_handling::{DomainError, InitializationError, InspectError};
pub use hsts::{parse as parse_hsts, HstsDetail};
pub use probe::{
    Headers, InMemoryProbeCache, ProbeCache, ProbeCacheKey, ProbeOutcome, Prober, RawTlsOutcome,
    VerifyMode,
};
pub use redirect::RedirectDetail;
pub use tls::TlsDetail;

/// The immutable result of inspecting one domain.
///
/// Owns the four endpoint records and the verdict derived from them.
/// Computed once per inspection and never mutated; consumers read these
/// fields without triggering re-probing.
#[derive(Debug, Clone, Serialize)]
pub struct Inspection {
    /// The domain that was inspected, normalized.
    pub domain: String,
    /// When the inspection ran.
    pub inspected_at: DateTime<Utc>,
    /// The four endpoint observations.
    pub records: EndpointRecords,
    /// The domain-level verdicts.
    pub verdict: DomainVerdict,
}

/// Inspects domains by probing their four endpoints and canonicalizing
/// the results.
///
/// An `Inspector` is cheap to share and reuse across domains; each call
/// to [`inspect`](Inspector::inspect) owns its own probe sequence.
pub struct Inspector {
    prober: Prober,
}

impl Inspector {
    /// Creates an inspector with no probe cache.
    ///
    /// # Errors
    ///
    /// Returns an `InitializationError` if the probe clients cannot be
    /// built.
    pub fn new(config: InspectionConfig) -> Result<Self, InitializationError> {
        Ok(Self {
            prober: Prober::new(config)?,
        })
    }

    /// Creates an inspector with an injected probe cache.
    ///
    /// # Errors
    ///
    /// Returns an `InitializationError` if the probe clients cannot be
    /// built.
    pub fn with_cache(
        config: InspectionConfig,
        cache: Arc<dyn ProbeCache>,
    ) -> Result<Self, InitializationError> {
        Ok(Self {
            prober: Prober::with_cache(config, Some(cache))?,
        })
    }

    /// Inspects a domain.
    ///
    /// The four endpoint evaluations run concurrently; the canonicalizer
    /// runs once all four records are in.
    ///
    /// # Arguments
    ///
    /// * `domain` - The domain to inspect, with or without a scheme
    ///   prefix (e.g. `example.org` or `https://example.org`)
    ///
    /// # Errors
    ///
    /// Returns `InspectError::InvalidDomain` when the input is not a
    /// probe-able registrable domain. Unreachable endpoints are not
    /// errors; they appear as `up = false` records.
    pub async fn inspect(&self, domain: &str) -> Result<Inspection, InspectError> {
        self.inspect_with_cancellation(domain, &CancellationToken::new())
            .await
    }

    /// Inspects a domain, abandoning in-flight probes when `cancel` fires.
    ///
    /// # Errors
    ///
    /// As [`inspect`](Inspector::inspect), plus `InspectError::Cancelled`
    /// when the token fires before all four endpoints complete.
    pub async fn inspect_with_cancellation(
        &self,
        domain: &str,
        cancel: &CancellationToken,
    ) -> Result<Inspection, InspectError> {
        let domain = normalize_target(domain)?;
        info!("inspecting {domain}");

        let [http_root, http_www, https_root, https_www] = EndpointKey::all();
        let evaluations = async {
            futures::join!(
                evaluate::evaluate_endpoint(&self.prober, &domain, http_root),
                evaluate::evaluate_endpoint(&self.prober, &domain, http_www),
                evaluate::evaluate_endpoint(&self.prober, &domain, https_root),
                evaluate::evaluate_endpoint(&self.prober, &domain, https_www),
            )
        };

        let (http_root, http_www, https_root, https_www) = tokio::select! {
            results = evaluations => results,
            _ = cancel.cancelled() => {
                warn!("inspection of {domain} cancelled");
                return Err(InspectError::Cancelled);
            }
        };

        let records = EndpointRecords {
            http_root: http_root?,
            http_www: http_www?,
            https_root: https_root?,
            https_www: https_www?,
        };
        let verdict = canonicalize(&records);
        info!(
            "{domain}: canonical {} (up: {}, enforces https: {})",
            verdict.canonical_url, verdict.up, verdict.enforce_https
        );

        Ok(Inspection {
            domain,
            inspected_at: Utc::now(),
            records,
            verdict,
        })
    }

    /// Evaluates a single endpoint of a domain.
    ///
    /// Exposed for callers that need one endpoint without a full
    /// inspection; [`inspect`](Inspector::inspect) is the usual entry
    /// point.
    ///
    /// # Errors
    ///
    /// Returns `InspectError::InvalidDomain` when the input is not a
    /// probe-able registrable domain.
    pub async fn evaluate_endpoint(
        &self,
        domain: &str,
        key: EndpointKey,
    ) -> Result<EndpointRecord, InspectError> {
        let domain = normalize_target(domain)?;
        evaluate::evaluate_endpoint(&self.prober, &domain, key)
            .await
            .map_err(InspectError::from)
    }
}

/// Normalizes an inspection target into a bare root hostname.
///
/// Accepts `example.org`, `www.example.org`, or either with a scheme
/// prefix; strips any path. The host must reduce to a registrable domain
/// (bare IPs and single-label hosts are rejected with a classified
/// error), but subdomains other than `www.` are kept as given.
fn normalize_target(input: &str) -> Result<String, InspectError> {
    let mut host = input.trim().to_ascii_lowercase();
    for scheme in ["https://", "http://"] {
        if let Some(rest) = host.strip_prefix(scheme) {
            host = rest.to_string();
            break;
        }
    }
    if let Some((before_path, _)) = host.split_once('/') {
        host = before_path.to_string();
    }
    let host = host.strip_prefix("www.").unwrap_or(&host).to_string();

    if host.is_empty() || host.contains(|c: char| c.is_whitespace() || c == ':' || c == '@') {
        return Err(DomainError::Unparseable(input.to_string()).into());
    }

    // Classifies IPs and single-label hosts; the host itself is kept
    // (probing inspects the host as given, not its registrable reduction)
    registrable_domain(&host)?;
    debug!("normalized inspection target {input:?} to {host:?}");
    Ok(host)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_target_plain_domain() {
        assert_eq!(normalize_target("example.org").unwrap(), "example.org");
    }

    #[test]
    fn test_normalize_target_strips_scheme_and_path() {
        assert_eq!(
            normalize_target("https://example.org/some/path").unwrap(),
            "example.org"
        );
        assert_eq!(
            normalize_target("http://example.org/").unwrap(),
            "example.org"
        );
    }

    #[test]
    fn test_normalize_target_strips_www() {
        assert_eq!(normalize_target("www.example.org").unwrap(), "example.org");
        assert_eq!(
            normalize_target("https://www.example.org").unwrap(),
            "example.org"
        );
    }

    #[test]
    fn test_normalize_target_keeps_other_subdomains() {
        assert_eq!(
            normalize_target("blog.example.org").unwrap(),
            "blog.example.org"
        );
    }

    #[test]
    fn test_normalize_target_lowercases() {
        assert_eq!(normalize_target("Example.ORG").unwrap(), "example.org");
    }

    #[test]
    fn test_normalize_target_rejects_ip() {
        assert!(matches!(
            normalize_target("192.0.2.1"),
            Err(InspectError::InvalidDomain(DomainError::IpAddress(_)))
        ));
    }

    #[test]
    fn test_normalize_target_rejects_single_label() {
        assert!(matches!(
            normalize_target("localhost"),
            Err(InspectError::InvalidDomain(DomainError::NotRegistrable(_)))
        ));
    }

    #[test]
    fn test_normalize_target_rejects_garbage() {
        assert!(normalize_target("").is_err());
        assert!(normalize_target("exa mple.org").is_err());
        assert!(normalize_target("user@example.org").is_err());
    }
}
