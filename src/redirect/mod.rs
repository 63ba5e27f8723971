//! Redirect resolution and classification.
//!
//! Given a probe that answered 3xx with a `Location` header, this module
//! resolves the immediate (single-hop) target and the eventual target
//! (after following the full chain), and classifies each against the
//! original request: www or not, HTTPS or not, internal or external.
//!
//! A failed eventual-chain resolution is an observable state
//! (`eventual_url = None`), never a swallowed error: one bad redirect hop
//! must not prevent reporting the other endpoints.

use log::warn;
use serde::Serialize;
use url::Url;

use crate::domain::same_site;
use crate::probe::{ProbeOutcome, Prober, RawTlsOutcome, VerifyMode};

/// Where a redirecting endpoint points, classified.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RedirectDetail {
    /// The single next hop from the first response.
    pub immediate_url: Url,
    /// Whether the immediate target host is a `www.` host.
    pub immediate_is_www: bool,
    /// Whether the immediate target uses HTTPS.
    pub immediate_is_https: bool,
    /// Whether the immediate target's registrable domain differs from the
    /// original request's (exact host comparison for non-registrable hosts).
    pub immediate_is_external: bool,
    /// The final URL reached after following the full chain; `None` when
    /// the chain could not be resolved (dead hop, loop, unfollowable TLS).
    pub eventual_url: Option<Url>,
    /// Whether the eventual target is external; always `false` when the
    /// eventual target is unknown.
    pub eventual_is_external: bool,
}

/// Resolves and classifies the redirect carried by `outcome`.
///
/// # Arguments
///
/// * `prober` - Used to re-issue the request with redirects followed
/// * `outcome` - The non-following probe that answered 3xx
/// * `safe_mode` - The TLS verification mode the classifier found safe for
///   this endpoint, so the chain can be followed past a known-bad axis
///
/// Returns `None` when the `Location` header is absent or unparseable.
pub(crate) async fn resolve(
    prober: &Prober,
    outcome: &ProbeOutcome,
    safe_mode: VerifyMode,
) -> Option<RedirectDetail> {
    let location = outcome.header("location")?;
    let immediate_url = match parse_location(&outcome.request_url, location) {
        Some(url) => url,
        None => {
            warn!(
                "unparseable Location header on {}: {location:?}",
                outcome.request_url
            );
            return None;
        }
    };

    let origin_host = outcome.request_url.host_str().unwrap_or_default();
    let immediate_host = immediate_url.host_str().unwrap_or_default().to_string();

    let immediate_is_www = immediate_host.starts_with("www.");
    let immediate_is_https = immediate_url.scheme() == "https";
    let immediate_is_external = !same_site(origin_host, &immediate_host);

    let (eventual_url, eventual_is_external) =
        resolve_eventual(prober, &outcome.request_url, safe_mode, origin_host).await;

    Some(RedirectDetail {
        immediate_url,
        immediate_is_www,
        immediate_is_https,
        immediate_is_external,
        eventual_url,
        eventual_is_external,
    })
}

/// Follows the full redirect chain and reports the final URL.
async fn resolve_eventual(
    prober: &Prober,
    request_url: &Url,
    safe_mode: VerifyMode,
    origin_host: &str,
) -> (Option<Url>, bool) {
    let mut followed = prober.probe(request_url, true, safe_mode).await;

    // A later hop can fail on a different TLS axis than the first one did
    // (for example an HTTP endpoint redirecting into badly-certified
    // HTTPS); one insecure retry keeps target discovery working.
    if !followed.is_up()
        && matches!(
            followed.tls,
            RawTlsOutcome::BadChain | RawTlsOutcome::BadHostname
        )
        && safe_mode != VerifyMode::Insecure
    {
        followed = prober.probe(request_url, true, VerifyMode::Insecure).await;
    }

    if !followed.is_up() {
        warn!("could not resolve redirect chain from {request_url}; target unknown");
        return (None, false);
    }

    let eventual_host = followed.effective_url.host_str().unwrap_or_default();
    let external = !same_site(origin_host, eventual_host);
    (Some(followed.effective_url), external)
}

/// Parses a `Location` header value against the URL that was requested.
///
/// Absolute targets are used directly; anything else is joined against the
/// request URL, which also covers protocol-relative and path-relative
/// forms. URL parsing lower-cases the scheme and host and normalizes
/// percent-encoding as a side effect.
pub(crate) fn parse_location(base: &Url, location: &str) -> Option<Url> {
    let location = location.trim();
    if location.is_empty() {
        return None;
    }
    Url::parse(location)
        .or_else(|_| base.join(location))
        .ok()
        .filter(|url| url.host_str().is_some())
}
