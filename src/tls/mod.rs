//! TLS failure classification for HTTPS endpoints.
//!
//! A single failed connection does not say *which* verification axis
//! failed; the classifier isolates chain validity from hostname validity
//! by re-probing with the axes toggled independently. This lets the
//! canonicalization rules distinguish "usable but untrusted" HTTPS from
//! "completely broken" HTTPS, and leaves behind a verification mode that
//! is known safe for following this endpoint's redirect chain.
//!
//! At most one re-probe is issued per failure axis, plus one final
//! both-axes-off probe when both fail, matching what a client that wants a
//! usable response has to do anyway.

use log::debug;
use serde::Serialize;
use url::Url;

use crate::probe::{ProbeOutcome, Prober, RawTlsOutcome, VerifyMode};

/// TLS verification posture of one HTTPS endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TlsDetail {
    /// The endpoint negotiated TLS under full verification.
    pub valid: bool,
    /// The certificate chain failed verification. Independent of
    /// `bad_hostname`; both can be true.
    pub bad_chain: bool,
    /// The certificate does not cover the probed hostname.
    pub bad_hostname: bool,
    /// Failure that is neither a chain nor a hostname problem (includes
    /// plain network unreachability of the HTTPS port).
    pub unknown_issue: Option<String>,
}

/// Classifier output: the posture, the most useful probe outcome obtained
/// along the way, and the verification mode found safe for follow-up
/// probes against this endpoint.
#[derive(Debug, Clone)]
pub(crate) struct ClassifiedTls {
    pub detail: TlsDetail,
    pub outcome: ProbeOutcome,
    pub safe_mode: VerifyMode,
}

/// Probes an HTTPS endpoint and classifies its TLS posture.
///
/// Algorithm:
/// 1. Probe with full verification; success means `valid`.
/// 2. On a chain failure, re-probe with chain verification off and
///    hostname verification on. If that still fails on the hostname,
///    both axes are bad; a final insecure probe obtains a usable response.
/// 3. Symmetric for an initial hostname failure.
/// 4. Anything else is recorded as an unknown issue.
pub(crate) async fn classify(prober: &Prober, url: &Url) -> ClassifiedTls {
    let first = prober.probe(url, false, VerifyMode::Full).await;
    if first.is_up() {
        return ClassifiedTls {
            detail: TlsDetail {
                valid: true,
                ..TlsDetail::default()
            },
            outcome: first,
            safe_mode: VerifyMode::Full,
        };
    }

    match first.tls.clone() {
        RawTlsOutcome::BadChain => {
            let mut detail = TlsDetail {
                bad_chain: true,
                ..TlsDetail::default()
            };
            let relaxed = prober.probe(url, false, VerifyMode::NoChain).await;
            if relaxed.is_up() {
                debug!("{url}: bad chain, hostname ok");
                return ClassifiedTls {
                    detail,
                    outcome: relaxed,
                    safe_mode: VerifyMode::NoChain,
                };
            }
            if relaxed.tls == RawTlsOutcome::BadHostname {
                debug!("{url}: bad chain and bad hostname");
                detail.bad_hostname = true;
                let usable = prober.probe(url, false, VerifyMode::Insecure).await;
                return ClassifiedTls {
                    detail,
                    outcome: usable,
                    safe_mode: VerifyMode::Insecure,
                };
            }
            if let RawTlsOutcome::Other(reason) = relaxed.tls.clone() {
                detail.unknown_issue = Some(reason);
            }
            ClassifiedTls {
                detail,
                outcome: relaxed,
                safe_mode: VerifyMode::NoChain,
            }
        }
        RawTlsOutcome::BadHostname => {
            let mut detail = TlsDetail {
                bad_hostname: true,
                ..TlsDetail::default()
            };
            let relaxed = prober.probe(url, false, VerifyMode::NoHostname).await;
            if relaxed.is_up() {
                debug!("{url}: bad hostname, chain ok");
                return ClassifiedTls {
                    detail,
                    outcome: relaxed,
                    safe_mode: VerifyMode::NoHostname,
                };
            }
            if relaxed.tls == RawTlsOutcome::BadChain {
                debug!("{url}: bad hostname and bad chain");
                detail.bad_chain = true;
                let usable = prober.probe(url, false, VerifyMode::Insecure).await;
                return ClassifiedTls {
                    detail,
                    outcome: usable,
                    safe_mode: VerifyMode::Insecure,
                };
            }
            if let RawTlsOutcome::Other(reason) = relaxed.tls.clone() {
                detail.unknown_issue = Some(reason);
            }
            ClassifiedTls {
                detail,
                outcome: relaxed,
                safe_mode: VerifyMode::NoHostname,
            }
        }
        RawTlsOutcome::Other(reason) => ClassifiedTls {
            detail: TlsDetail {
                unknown_issue: Some(reason),
                ..TlsDetail::default()
            },
            outcome: first,
            safe_mode: VerifyMode::Full,
        },
        // A down probe never reports Ok/NotApplicable for an HTTPS URL;
        // treat it as an unclassified failure if it ever happens
        RawTlsOutcome::Ok | RawTlsOutcome::NotApplicable => ClassifiedTls {
            detail: TlsDetail::default(),
            outcome: first,
            safe_mode: VerifyMode::Full,
        },
    }
}
