//! Registrable-domain extraction and comparison.
//!
//! This module reduces hostnames to their registrable domain using the
//! Public Suffix List (PSL), and classifies the hosts that cannot be
//! reduced (IP literals, single-label hosts). Redirect classification
//! depends on these helpers to decide whether a target is external.

use std::net::IpAddr;

use crate::error_handling::DomainError;

/// Extracts the registrable domain from a hostname using the PSL.
///
/// # Arguments
///
/// * `host` - The hostname to reduce (e.g., "www.example.co.uk")
///
/// # Returns
///
/// The registrable domain (e.g., "example.co.uk").
///
/// # Errors
///
/// Returns a classified `DomainError` if the host is an IP literal, has no
/// registrable domain under the PSL, or is empty.
///
/// Handles both simple TLDs (e.g., "example.com") and multi-part TLDs
/// (e.g., "example.co.uk"). Unlisted suffixes follow the PSL prevailing
/// convention: the last label is treated as the suffix, so "site.internal"
/// still yields "site.internal" while a bare "internal" does not.
pub fn registrable_domain(host: &str) -> Result<String, DomainError> {
    let host = host.trim_end_matches('.');
    if host.is_empty() {
        return Err(DomainError::Unparseable(host.to_string()));
    }

    // IP literals never have registrable domains; IPv6 hosts arrive both
    // bracketed (from URLs) and bare
    let bare = host.trim_start_matches('[').trim_end_matches(']');
    if bare.parse::<IpAddr>().is_ok() {
        return Err(DomainError::IpAddress(host.to_string()));
    }

    psl::domain_str(&host.to_ascii_lowercase())
        .map(str::to_string)
        .ok_or_else(|| DomainError::NotRegistrable(host.to_string()))
}

/// Reports whether two hosts belong to the same registrable domain.
///
/// When either host is not a valid registrable domain (an IP literal, a
/// single-label host), the comparison falls back to exact host-string
/// comparison rather than failing: `http://10.0.0.1/` redirecting to
/// itself is still internal.
pub fn same_site(a: &str, b: &str) -> bool {
    match (registrable_domain(a), registrable_domain(b)) {
        (Ok(x), Ok(y)) => x == y,
        _ => a.eq_ignore_ascii_case(b),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registrable_domain_simple() {
        assert_eq!(registrable_domain("example.com").unwrap(), "example.com");
        assert_eq!(
            registrable_domain("www.example.com").unwrap(),
            "example.com"
        );
    }

    #[test]
    fn test_registrable_domain_multi_part_tld() {
        assert_eq!(
            registrable_domain("www.example.co.uk").unwrap(),
            "example.co.uk"
        );
    }

    #[test]
    fn test_registrable_domain_case_insensitive() {
        assert_eq!(
            registrable_domain("WWW.Example.COM").unwrap(),
            "example.com"
        );
    }

    #[test]
    fn test_registrable_domain_rejects_ip() {
        assert_eq!(
            registrable_domain("192.0.2.1"),
            Err(DomainError::IpAddress("192.0.2.1".to_string()))
        );
        assert!(matches!(
            registrable_domain("[2001:db8::1]"),
            Err(DomainError::IpAddress(_))
        ));
    }

    #[test]
    fn test_registrable_domain_rejects_single_label() {
        assert!(matches!(
            registrable_domain("localhost"),
            Err(DomainError::NotRegistrable(_))
        ));
    }

    #[test]
    fn test_registrable_domain_rejects_empty() {
        assert!(matches!(
            registrable_domain(""),
            Err(DomainError::Unparseable(_))
        ));
    }

    #[test]
    fn test_same_site_www_variant() {
        assert!(same_site("example.com", "www.example.com"));
        assert!(same_site("www.example.co.uk", "example.co.uk"));
    }

    #[test]
    fn test_same_site_different_domains() {
        assert!(!same_site("example.com", "example.org"));
        assert!(!same_site("example.com", "notexample.com"));
    }

    #[test]
    fn test_same_site_subdomain_of_same_registrable() {
        assert!(same_site("a.example.com", "b.example.com"));
    }

    #[test]
    fn test_same_site_ip_fallback_exact_match() {
        // Hosts without registrable domains compare as raw strings
        assert!(same_site("192.0.2.1", "192.0.2.1"));
        assert!(!same_site("192.0.2.1", "192.0.2.2"));
        assert!(same_site("localhost", "LOCALHOST"));
        assert!(!same_site("localhost", "otherhost"));
    }
}
