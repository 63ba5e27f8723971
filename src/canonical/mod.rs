//! Domain canonicalization.
//!
//! A pure function from the four endpoint records to domain-level
//! verdicts: canonical protocol and subdomain, liveness, HTTPS support and
//! enforcement, downgrade detection, HSTS scope, and redirect-domain
//! summary. No network access happens here.
//!
//! Tie-break policy: every rule trusts *immediate, internal* redirect
//! evidence over eventual-redirect evidence. Eventual targets can pass
//! through third parties; only the first hop expresses the site
//! operator's own intent.

use serde::Serialize;
use url::Url;

use crate::endpoint::{EndpointKey, EndpointRecord, EndpointRecords, Protocol, Subdomain};

/// Domain-level verdicts derived from the four endpoint records.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DomainVerdict {
    /// The subdomain judged to be the site's primary address.
    pub canonical_endpoint: Subdomain,
    /// The protocol judged to be the site's primary protocol.
    pub canonical_protocol: Protocol,
    /// The URL of the canonical endpoint.
    pub canonical_url: Url,
    /// Whether any of the four endpoints answered.
    pub up: bool,
    /// Both root endpoints are down.
    pub broken_root: bool,
    /// Both www endpoints are down.
    pub broken_www: bool,
    /// An HTTPS endpoint is reachable with a certificate valid for its
    /// hostname (an untrusted chain alone still counts as support).
    pub support_https: bool,
    /// The canonical protocol is HTTPS.
    pub default_https: bool,
    /// HTTPS is offered but the canonical host's HTTPS endpoint steps
    /// back to HTTP via an internal redirect.
    pub downgrade_https: bool,
    /// Every reachable HTTP endpoint immediately redirects to HTTPS.
    pub enforce_https: bool,
    /// The domain exists only to redirect elsewhere.
    pub is_redirect_domain: bool,
    /// Where a redirect domain eventually lands; `None` for non-redirect
    /// domains or when the chain could not be resolved.
    pub redirect_target: Option<Url>,
    /// The canonical endpoint's honored HSTS policy is enabled.
    pub hsts_on_canonical: bool,
    /// The canonical endpoint's raw HSTS header, when present.
    pub hsts_header_on_canonical: Option<String>,
    /// HSTS covers the whole domain: declared at the apex over valid
    /// HTTPS with `includeSubDomains`.
    pub hsts_entire_domain: bool,
    /// The whole-domain HSTS policy also meets the preload requirements.
    pub hsts_entire_domain_preload: bool,
}

/// Derives the domain verdict from the four endpoint records.
pub fn canonicalize(records: &EndpointRecords) -> DomainVerdict {
    let http_root = &records.http_root;
    let http_www = &records.http_www;
    let https_root = &records.https_root;
    let https_www = &records.https_www;

    let canonical_endpoint = if canonically_www(records) {
        Subdomain::Www
    } else {
        Subdomain::Root
    };
    let canonical_protocol = if canonically_https(records) {
        Protocol::Https
    } else {
        Protocol::Http
    };
    let canonical = records.get(EndpointKey::new(canonical_protocol, canonical_endpoint));

    let up = records.iter().any(|r| r.up);
    let broken_root = !http_root.up && !https_root.up;
    let broken_www = !http_www.up && !https_www.up;

    let support_https =
        [https_root, https_www].iter().any(|r| r.up && !r.bad_hostname());

    // HTTPS offered but stepping back to HTTP on the canonical host
    let canonical_https = records.get(EndpointKey::new(Protocol::Https, canonical_endpoint));
    let downgrade_https = support_https
        && canonical_https
            .redirect
            .as_ref()
            .is_some_and(|r| !r.immediate_is_external && !r.immediate_is_https);

    // An immediate HTTP-to-HTTPS redirect counts as enforcement even when
    // it crosses domains; only non-immediate patterns fail this
    let enforce_https = (https_root.up || https_www.up)
        && [http_root, http_www]
            .iter()
            .all(|r| !r.up || r.redirect.as_ref().is_some_and(|d| d.immediate_is_https));

    let is_redirect_domain = up
        && records.iter().all(|r| {
            !r.up
                || r.status >= 400
                || r.bad_hostname()
                || r.redirect.as_ref().is_some_and(|d| d.immediate_is_external)
        });
    let redirect_target = if is_redirect_domain {
        canonical
            .redirect
            .as_ref()
            .and_then(|d| d.eventual_url.clone())
    } else {
        None
    };

    // Whole-domain HSTS must be declared from the apex; a policy on the
    // www host covers only the www host
    let hsts_entire_domain = https_root.hsts.enabled && https_root.hsts.include_subdomains;
    let hsts_entire_domain_preload = hsts_entire_domain && https_root.hsts.preload_ready;

    DomainVerdict {
        canonical_endpoint,
        canonical_protocol,
        canonical_url: canonical.url.clone(),
        up,
        broken_root,
        broken_www,
        support_https,
        default_https: canonical_protocol == Protocol::Https,
        downgrade_https,
        enforce_https,
        is_redirect_domain,
        redirect_target,
        hsts_on_canonical: canonical.hsts.enabled,
        hsts_header_on_canonical: canonical.hsts_header.clone(),
        hsts_entire_domain,
        hsts_entire_domain_preload,
    }
}

/// A domain is canonically www when:
/// 1. at least one www endpoint (either protocol) answers, and
/// 2. neither root endpoint serves a clean live response (each is down,
///    redirects, or, for HTTPS, fails hostname verification), and
/// 3. either both root endpoints are down outright, or at least one root
///    redirects immediately and internally to a www host.
///
/// This affirms chains like `http://` -> `https://` -> `https://www` while
/// rejecting chains that leave the registrable domain or land on non-www.
fn canonically_www(records: &EndpointRecords) -> bool {
    if !records.http_www.up && !records.https_www.up {
        return false;
    }

    let https_root = &records.https_root;
    let http_root = &records.http_root;

    let https_root_unclean =
        !https_root.up || https_root.is_redirect() || https_root.bad_hostname();
    let http_root_unclean = !http_root.up || http_root.is_redirect();
    if !(https_root_unclean && http_root_unclean) {
        return false;
    }

    let both_roots_down = !https_root.up && !http_root.up;
    both_roots_down
        || [https_root, http_root].iter().any(|r| {
            r.redirect
                .as_ref()
                .is_some_and(|d| d.immediate_is_www && !d.immediate_is_external)
        })
}

/// A domain is canonically HTTPS when:
/// 1. at least one HTTPS endpoint answers with a certificate valid for
///    its hostname (chain validity not required), and
/// 2. neither HTTP endpoint serves a clean live response (each is down or
///    redirects), and
/// 3. at least one HTTP endpoint redirects immediately and internally to
///    HTTPS.
fn canonically_https(records: &EndpointRecords) -> bool {
    let live_https = [&records.https_root, &records.https_www]
        .iter()
        .any(|r| r.up && !r.bad_hostname());
    if !live_https {
        return false;
    }

    let http_endpoints = [&records.http_root, &records.http_www];
    if !http_endpoints.iter().all(|r| !r.up || r.is_redirect()) {
        return false;
    }

    http_endpoints.iter().any(|r| {
        r.redirect
            .as_ref()
            .is_some_and(|d| d.immediate_is_https && !d.immediate_is_external)
    })
}
