//! Integration tests for single-endpoint evaluation.
//!
//! These tests route probes at a local mock server via the config's DNS
//! and port overrides, and verify:
//! - Redirect classification (immediate target, www/https/external flags)
//! - HSTS handling over plain HTTP (recorded but never honored)
//! - Evaluation idempotence under an injected probe cache

use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;

use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use domain_posture::{
    EndpointKey, InMemoryProbeCache, InspectionConfig, Inspector, Protocol, Subdomain,
};

const DOMAIN: &str = "example.test";

/// Routes `example.test` (and its www host) at the mock server for HTTP
/// probes; HTTPS probes go to a closed port and come back down.
fn config_for(server: &MockServer) -> InspectionConfig {
    let addr = *server.address();
    InspectionConfig {
        timeout_seconds: 5,
        http_port: addr.port(),
        https_port: 1,
        dns_overrides: HashMap::from([
            (DOMAIN.to_string(), addr.ip()),
            (format!("www.{DOMAIN}"), addr.ip()),
            ("other.test".to_string(), addr.ip()),
        ]),
        ..Default::default()
    }
}

fn host_header(server: &MockServer, host: &str) -> String {
    format!("{host}:{}", server.address().port())
}

#[tokio::test]
async fn test_redirect_immediate_classification() {
    let server = MockServer::start().await;
    let root_host = host_header(&server, DOMAIN);

    // 301 to the HTTPS www host on the same registrable domain
    Mock::given(method("GET"))
        .and(path("/"))
        .and(header("host", root_host.as_str()))
        .respond_with(
            ResponseTemplate::new(301).insert_header("Location", "https://www.example.test/"),
        )
        .mount(&server)
        .await;

    let inspector = Inspector::new(config_for(&server)).unwrap();
    let record = inspector
        .evaluate_endpoint(DOMAIN, EndpointKey::new(Protocol::Http, Subdomain::Root))
        .await
        .unwrap();

    assert!(record.up);
    assert_eq!(record.status, 301);
    let redirect = record.redirect.expect("redirect detail present");
    assert_eq!(redirect.immediate_url.as_str(), "https://www.example.test/");
    assert!(redirect.immediate_is_https);
    assert!(redirect.immediate_is_www);
    assert!(!redirect.immediate_is_external);
    // The chain dead-ends on the closed HTTPS port: the eventual target
    // is the explicit unknown state, not an error
    assert_eq!(redirect.eventual_url, None);
    assert!(!redirect.eventual_is_external);
}

#[tokio::test]
async fn test_redirect_eventual_target_resolved() {
    let server = MockServer::start().await;
    let root_host = host_header(&server, DOMAIN);
    let external_host = host_header(&server, "other.test");
    let landing = format!("http://{external_host}/landing");

    Mock::given(method("GET"))
        .and(path("/"))
        .and(header("host", root_host.as_str()))
        .respond_with(ResponseTemplate::new(302).insert_header("Location", landing.as_str()))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/landing"))
        .and(header("host", external_host.as_str()))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let inspector = Inspector::new(config_for(&server)).unwrap();
    let record = inspector
        .evaluate_endpoint(DOMAIN, EndpointKey::new(Protocol::Http, Subdomain::Root))
        .await
        .unwrap();

    let redirect = record.redirect.expect("redirect detail present");
    assert!(redirect.immediate_is_external);
    assert!(!redirect.immediate_is_www);
    assert!(!redirect.immediate_is_https);
    assert_eq!(
        redirect.eventual_url.as_ref().map(|u| u.as_str()),
        Some(landing.as_str())
    );
    assert!(redirect.eventual_is_external);
}

#[tokio::test]
async fn test_relative_location_resolved_against_request_url() {
    let server = MockServer::start().await;
    let root_host = host_header(&server, DOMAIN);

    Mock::given(method("GET"))
        .and(path("/"))
        .and(header("host", root_host.as_str()))
        .respond_with(ResponseTemplate::new(301).insert_header("Location", "/landing"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/landing"))
        .and(header("host", root_host.as_str()))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let inspector = Inspector::new(config_for(&server)).unwrap();
    let record = inspector
        .evaluate_endpoint(DOMAIN, EndpointKey::new(Protocol::Http, Subdomain::Root))
        .await
        .unwrap();

    let redirect = record.redirect.expect("redirect detail present");
    assert_eq!(redirect.immediate_url.host_str(), Some(DOMAIN));
    assert_eq!(redirect.immediate_url.path(), "/landing");
    assert!(!redirect.immediate_is_external);
    // Same-host redirect resolves to its own landing page
    assert!(redirect
        .eventual_url
        .as_ref()
        .is_some_and(|u| u.path() == "/landing"));
    assert!(!redirect.eventual_is_external);
}

#[tokio::test]
async fn test_hsts_over_plain_http_is_recorded_but_not_honored() {
    let server = MockServer::start().await;
    let root_host = host_header(&server, DOMAIN);

    Mock::given(method("GET"))
        .and(path("/"))
        .and(header("host", root_host.as_str()))
        .respond_with(
            ResponseTemplate::new(200).insert_header(
                "Strict-Transport-Security",
                "max-age=31536000; includeSubDomains; preload",
            ),
        )
        .mount(&server)
        .await;

    let inspector = Inspector::new(config_for(&server)).unwrap();
    let record = inspector
        .evaluate_endpoint(DOMAIN, EndpointKey::new(Protocol::Http, Subdomain::Root))
        .await
        .unwrap();

    assert!(record.up);
    assert_eq!(
        record.hsts_header.as_deref(),
        Some("max-age=31536000; includeSubDomains; preload")
    );
    // HSTS from a plain-HTTP response must never be honored
    assert!(!record.hsts.enabled);
    assert!(!record.hsts.preload_ready);
}

#[tokio::test]
async fn test_evaluation_is_idempotent_under_probe_cache() {
    let server = MockServer::start().await;
    let root_host = host_header(&server, DOMAIN);

    // The mock verifies on drop that exactly one request arrived: the
    // second evaluation must be served entirely from the cache
    Mock::given(method("GET"))
        .and(path("/"))
        .and(header("host", root_host.as_str()))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let cache = Arc::new(InMemoryProbeCache::new());
    let inspector = Inspector::with_cache(config_for(&server), cache.clone()).unwrap();
    let key = EndpointKey::new(Protocol::Http, Subdomain::Root);

    let first = inspector.evaluate_endpoint(DOMAIN, key).await.unwrap();
    let second = inspector.evaluate_endpoint(DOMAIN, key).await.unwrap();

    assert_eq!(first, second);
    assert!(!cache.is_empty());
}

#[tokio::test]
async fn test_unreachable_endpoint_is_down_not_error() {
    // Nothing listens on port 1; both the probe and the evaluation must
    // report "down" rather than failing
    let config = InspectionConfig {
        timeout_seconds: 5,
        http_port: 1,
        https_port: 1,
        dns_overrides: HashMap::from([(
            DOMAIN.to_string(),
            IpAddr::V4(Ipv4Addr::LOCALHOST),
        )]),
        ..Default::default()
    };

    let inspector = Inspector::new(config).unwrap();
    let record = inspector
        .evaluate_endpoint(DOMAIN, EndpointKey::new(Protocol::Http, Subdomain::Root))
        .await
        .unwrap();

    assert!(!record.up);
    assert_eq!(record.status, 0);
    assert!(record.headers.is_empty());
    assert_eq!(record.redirect, None);
    assert!(!record.hsts.enabled);
}
