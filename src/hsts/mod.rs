//! `Strict-Transport-Security` header parsing.
//!
//! Parses the raw header value into structured fields. Parsing never fails:
//! an absent or malformed header is simply a disabled policy. Whether a
//! parsed policy is *honored* is the evaluator's decision (HSTS delivered
//! over plain HTTP or invalid TLS must never be honored).

use serde::Serialize;

use crate::config::HSTS_PRELOAD_MIN_AGE_SECS;

/// Structured HSTS policy derived from a `Strict-Transport-Security` header.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HstsDetail {
    /// Whether the header carried a usable, non-negative `max-age` directive.
    pub enabled: bool,
    /// The `max-age` value in seconds, when present and parseable.
    pub max_age: Option<i64>,
    /// Whether the `includeSubDomains` directive is present.
    pub include_subdomains: bool,
    /// Whether the policy meets all browser preload-list requirements:
    /// enabled, `max-age` of at least one year, `includeSubDomains`, and
    /// the `preload` token.
    pub preload_ready: bool,
}

/// Parses a `Strict-Transport-Security` header value.
///
/// # Arguments
///
/// * `header` - The raw header value, or `None` when the response carried
///   no HSTS header.
///
/// Directive names are matched case-insensitively and values may be quoted,
/// per RFC 6797. Unknown directives are ignored; a malformed `max-age`
/// leaves the policy disabled rather than failing.
pub fn parse(header: Option<&str>) -> HstsDetail {
    let Some(header) = header else {
        return HstsDetail::default();
    };

    let mut max_age: Option<i64> = None;
    let mut include_subdomains = false;
    let mut preload = false;

    for directive in header.split(';') {
        let directive = directive.trim();
        let (name, value) = match directive.split_once('=') {
            Some((name, value)) => (name.trim(), Some(value.trim().trim_matches('"'))),
            None => (directive, None),
        };

        if name.eq_ignore_ascii_case("max-age") {
            // First valid occurrence wins; repeated directives are ignored
            if max_age.is_none() {
                max_age = value.and_then(|v| v.parse::<i64>().ok());
            }
        } else if name.eq_ignore_ascii_case("includeSubDomains") {
            include_subdomains = true;
        } else if name.eq_ignore_ascii_case("preload") {
            preload = true;
        }
    }

    let enabled = matches!(max_age, Some(age) if age >= 0);
    let preload_ready = enabled
        && max_age.is_some_and(|age| age >= HSTS_PRELOAD_MIN_AGE_SECS)
        && include_subdomains
        && preload;

    HstsDetail {
        enabled,
        max_age,
        include_subdomains,
        preload_ready,
    }
}
