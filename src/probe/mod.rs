//! The endpoint prober.
//!
//! One probe is one HTTP(S) request for one URL, with redirect-following
//! and both TLS verification axes controlled per call. Network-level
//! failures (timeout, refused connection, DNS failure) are data, not
//! errors: they come back as `status = 0` outcomes so the evaluator can
//! treat the endpoint as down.

mod cache;
pub(crate) mod verifier;

use std::collections::{BTreeMap, HashMap};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use log::debug;
use reqwest::{redirect::Policy, Client, ClientBuilder, Url};
use rustls::{CertificateError, RootCertStore};
use serde::Serialize;

use crate::config::{InspectionConfig, MAX_REDIRECT_HOPS, TCP_CONNECT_TIMEOUT_SECS};
use crate::error_handling::InitializationError;
use crate::initialization::init_crypto_provider;

pub use cache::{InMemoryProbeCache, ProbeCache, ProbeCacheKey};

/// Response headers, lower-cased into a deterministic map.
///
/// HTTP header names are case-insensitive; normalizing to lowercase at the
/// probe boundary keeps every later lookup a plain map access.
pub type Headers = BTreeMap<String, String>;

/// Which TLS verification axes a probe enforces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum VerifyMode {
    /// Verify certificate chain and hostname (browser behavior).
    Full,
    /// Skip chain verification, still verify the hostname.
    NoChain,
    /// Verify the chain, skip hostname verification.
    NoHostname,
    /// Skip both axes; only useful for obtaining a response from an
    /// endpoint already known to fail verification.
    Insecure,
}

impl VerifyMode {
    /// All modes, in the order probe clients are constructed.
    pub const ALL: [VerifyMode; 4] = [
        VerifyMode::Full,
        VerifyMode::NoChain,
        VerifyMode::NoHostname,
        VerifyMode::Insecure,
    ];

    /// Whether this mode verifies the certificate chain.
    pub fn verify_chain(self) -> bool {
        matches!(self, VerifyMode::Full | VerifyMode::NoHostname)
    }

    /// Whether this mode verifies the certificate hostname.
    pub fn verify_hostname(self) -> bool {
        matches!(self, VerifyMode::Full | VerifyMode::NoChain)
    }
}

/// The raw TLS result of a single connection attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum RawTlsOutcome {
    /// TLS negotiated cleanly under the requested verification mode.
    Ok,
    /// The certificate chain failed verification (untrusted issuer,
    /// expired, revoked, malformed).
    BadChain,
    /// The certificate does not cover the requested hostname.
    BadHostname,
    /// The attempt failed for a reason that is not a recognized TLS
    /// verification failure (network errors included); carries a short
    /// description.
    Other(String),
    /// The probe was plain HTTP; TLS does not apply.
    NotApplicable,
}

/// The normalized result of one probe.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProbeOutcome {
    /// The URL the probe was issued for.
    pub request_url: Url,
    /// The URL actually reached (differs from `request_url` only when
    /// redirects were followed).
    pub effective_url: Url,
    /// HTTP status code; 0 means the endpoint was unreachable.
    pub status: u16,
    /// Response headers, lower-cased.
    pub headers: Headers,
    /// Raw TLS result of the connection.
    pub tls: RawTlsOutcome,
}

impl ProbeOutcome {
    /// Whether the probe reached the endpoint at all.
    pub fn is_up(&self) -> bool {
        self.status != 0
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
    }

    fn unreachable(request_url: Url, tls: RawTlsOutcome) -> Self {
        Self {
            effective_url: request_url.clone(),
            request_url,
            status: 0,
            headers: Headers::new(),
            tls,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct ClientKey {
    follow_redirects: bool,
    verify: VerifyMode,
}

/// Issues probes with per-call redirect and TLS verification behavior.
///
/// Holds one pre-built `reqwest` client per (redirect policy, verification
/// mode) combination, since both are client-level settings in `reqwest`.
/// An optional [`ProbeCache`] is injected at construction time.
pub struct Prober {
    config: InspectionConfig,
    clients: HashMap<ClientKey, Client>,
    cache: Option<Arc<dyn ProbeCache>>,
}

impl Prober {
    /// Creates a prober with no cache.
    ///
    /// # Errors
    ///
    /// Returns an `InitializationError` if a probe client cannot be built.
    pub fn new(config: InspectionConfig) -> Result<Self, InitializationError> {
        Self::with_cache(config, None)
    }

    /// Creates a prober with an injected probe cache.
    ///
    /// # Errors
    ///
    /// Returns an `InitializationError` if a probe client cannot be built.
    pub fn with_cache(
        config: InspectionConfig,
        cache: Option<Arc<dyn ProbeCache>>,
    ) -> Result<Self, InitializationError> {
        init_crypto_provider();

        let mut roots = RootCertStore::empty();
        roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
        let roots = Arc::new(roots);

        let mut clients = HashMap::new();
        for follow_redirects in [false, true] {
            for verify in VerifyMode::ALL {
                let key = ClientKey {
                    follow_redirects,
                    verify,
                };
                clients.insert(key, build_client(&config, follow_redirects, verify, &roots)?);
            }
        }

        Ok(Self {
            config,
            clients,
            cache,
        })
    }

    /// The configuration this prober was built with.
    pub fn config(&self) -> &InspectionConfig {
        &self.config
    }

    /// Issues one probe.
    ///
    /// # Arguments
    ///
    /// * `url` - The exact URL to request
    /// * `follow_redirects` - Whether to follow the redirect chain to its
    ///   end (bounded by `MAX_REDIRECT_HOPS`)
    /// * `verify` - Which TLS verification axes to enforce
    ///
    /// Never fails: unreachable endpoints produce a `status = 0` outcome
    /// with the failure reason in the TLS field.
    pub async fn probe(
        &self,
        url: &Url,
        follow_redirects: bool,
        verify: VerifyMode,
    ) -> ProbeOutcome {
        let cache_key = ProbeCacheKey::new(url, follow_redirects, verify);
        if let Some(cache) = &self.cache {
            if let Some(hit) = cache.get(&cache_key) {
                debug!("probe cache hit for {url} (follow={follow_redirects}, {verify:?})");
                return hit;
            }
        }

        let client = self
            .clients
            .get(&ClientKey {
                follow_redirects,
                verify,
            })
            .expect("client exists for every mode combination");

        debug!("probing {url} (follow={follow_redirects}, {verify:?})");
        let outcome = match client.get(url.clone()).send().await {
            Ok(response) => ProbeOutcome {
                request_url: url.clone(),
                effective_url: response.url().clone(),
                status: response.status().as_u16(),
                headers: normalize_headers(response.headers()),
                tls: if url.scheme() == "https" {
                    RawTlsOutcome::Ok
                } else {
                    RawTlsOutcome::NotApplicable
                },
            },
            Err(err) => {
                let tls = classify_request_error(&err);
                debug!("probe of {url} failed: {tls:?}");
                ProbeOutcome::unreachable(url.clone(), tls)
            }
        };

        if let Some(cache) = &self.cache {
            cache.put(cache_key, outcome.clone());
        }
        outcome
    }
}

fn build_client(
    config: &InspectionConfig,
    follow_redirects: bool,
    verify: VerifyMode,
    roots: &Arc<RootCertStore>,
) -> Result<Client, InitializationError> {
    let tls = verifier::client_tls_config(Arc::clone(roots), verify)?;

    let redirect_policy = if follow_redirects {
        Policy::limited(MAX_REDIRECT_HOPS)
    } else {
        Policy::none()
    };

    let mut builder = ClientBuilder::new()
        .redirect(redirect_policy)
        .timeout(Duration::from_secs(config.timeout_seconds))
        .connect_timeout(Duration::from_secs(TCP_CONNECT_TIMEOUT_SECS))
        .user_agent(config.user_agent.clone())
        .use_preconfigured_tls(tls);

    // Port 0 keeps the URL's port; only address resolution is overridden
    for (host, ip) in &config.dns_overrides {
        builder = builder.resolve(host, SocketAddr::new(*ip, 0));
    }

    builder.build().map_err(InitializationError::from)
}

/// Lower-cases response header names into a `Headers` map.
pub(crate) fn normalize_headers(headers: &reqwest::header::HeaderMap) -> Headers {
    headers
        .iter()
        .map(|(name, value)| {
            (
                name.as_str().to_ascii_lowercase(),
                value.to_str().unwrap_or_default().to_string(),
            )
        })
        .collect()
}

/// Maps a failed probe to its raw TLS outcome.
fn classify_request_error(err: &reqwest::Error) -> RawTlsOutcome {
    if let Some(outcome) = tls_outcome_from_error(err) {
        return outcome;
    }

    // reqwest does not always preserve the typed rustls error across the
    // hyper boundary; fall back to matching the rendered error chain
    let rendered = format!("{err:?}");
    if rendered.contains("NotValidForName") {
        RawTlsOutcome::BadHostname
    } else if rendered.contains("InvalidCertificate") || rendered.contains("UnknownIssuer") {
        RawTlsOutcome::BadChain
    } else {
        RawTlsOutcome::Other(describe_request_error(err))
    }
}

/// Walks an error source chain looking for a typed rustls failure.
pub(crate) fn tls_outcome_from_error(
    err: &(dyn std::error::Error + 'static),
) -> Option<RawTlsOutcome> {
    let mut source: Option<&(dyn std::error::Error + 'static)> = Some(err);
    while let Some(current) = source {
        if let Some(tls_err) = current.downcast_ref::<rustls::Error>() {
            return Some(match tls_err {
                rustls::Error::InvalidCertificate(cert_err) => {
                    if matches!(
                        cert_err,
                        CertificateError::NotValidForName
                            | CertificateError::NotValidForNameContext { .. }
                    ) {
                        RawTlsOutcome::BadHostname
                    } else {
                        RawTlsOutcome::BadChain
                    }
                }
                other => RawTlsOutcome::Other(other.to_string()),
            });
        }
        source = current.source();
    }
    None
}

/// Short, stable description of a non-TLS request failure.
fn describe_request_error(err: &reqwest::Error) -> String {
    if err.is_timeout() {
        "timeout".to_string()
    } else if err.is_connect() {
        "connect error".to_string()
    } else if err.is_redirect() {
        "redirect loop or too many redirects".to_string()
    } else if err.is_request() {
        "request error".to_string()
    } else {
        "other error".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httptest::{matchers::*, responders::*, Expectation, Server};
    use std::io;

    fn test_prober() -> Prober {
        Prober::new(InspectionConfig {
            timeout_seconds: 5,
            ..Default::default()
        })
        .expect("prober builds")
    }

    fn server_url(server: &Server, path: &str) -> Url {
        Url::parse(&server.url(path).to_string()).expect("server url parses")
    }

    #[tokio::test]
    async fn test_probe_does_not_follow_redirects_unless_asked() {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path("GET", "/")).respond_with(
                status_code(301)
                    .insert_header("Location", "/landing")
                    .insert_header("X-Probe", "yes"),
            ),
        );

        let prober = test_prober();
        let url = server_url(&server, "/");
        let outcome = prober.probe(&url, false, VerifyMode::Full).await;

        assert!(outcome.is_up());
        assert_eq!(outcome.status, 301);
        assert_eq!(outcome.header("location"), Some("/landing"));
        assert_eq!(outcome.header("LOCATION"), Some("/landing"));
        assert_eq!(outcome.header("x-probe"), Some("yes"));
        assert_eq!(outcome.effective_url, url);
        assert_eq!(outcome.tls, RawTlsOutcome::NotApplicable);
    }

    #[tokio::test]
    async fn test_probe_follows_redirects_when_asked() {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path("GET", "/"))
                .respond_with(status_code(302).insert_header("Location", "/landing")),
        );
        server.expect(
            Expectation::matching(request::method_path("GET", "/landing"))
                .respond_with(status_code(200)),
        );

        let prober = test_prober();
        let url = server_url(&server, "/");
        let outcome = prober.probe(&url, true, VerifyMode::Full).await;

        assert_eq!(outcome.status, 200);
        assert_eq!(outcome.effective_url.path(), "/landing");
    }

    #[tokio::test]
    async fn test_probe_unreachable_is_status_zero_not_error() {
        let prober = test_prober();
        // Port 1 on loopback refuses immediately
        let url = Url::parse("http://127.0.0.1:1/").unwrap();
        let outcome = prober.probe(&url, false, VerifyMode::Full).await;

        assert!(!outcome.is_up());
        assert_eq!(outcome.status, 0);
        assert!(outcome.headers.is_empty());
        assert!(matches!(outcome.tls, RawTlsOutcome::Other(_)));
    }

    #[test]
    fn test_verify_mode_axes() {
        assert!(VerifyMode::Full.verify_chain() && VerifyMode::Full.verify_hostname());
        assert!(!VerifyMode::NoChain.verify_chain() && VerifyMode::NoChain.verify_hostname());
        assert!(VerifyMode::NoHostname.verify_chain() && !VerifyMode::NoHostname.verify_hostname());
        assert!(!VerifyMode::Insecure.verify_chain() && !VerifyMode::Insecure.verify_hostname());
    }

    #[test]
    fn test_tls_outcome_from_error_chain_walk() {
        // rustls errors arrive wrapped in io::Error by the transport layer
        let bad_chain = io::Error::new(
            io::ErrorKind::InvalidData,
            rustls::Error::InvalidCertificate(CertificateError::UnknownIssuer),
        );
        assert_eq!(
            tls_outcome_from_error(&bad_chain),
            Some(RawTlsOutcome::BadChain)
        );

        let bad_hostname = io::Error::new(
            io::ErrorKind::InvalidData,
            rustls::Error::InvalidCertificate(CertificateError::NotValidForName),
        );
        assert_eq!(
            tls_outcome_from_error(&bad_hostname),
            Some(RawTlsOutcome::BadHostname)
        );

        let expired = io::Error::new(
            io::ErrorKind::InvalidData,
            rustls::Error::InvalidCertificate(CertificateError::Expired),
        );
        assert_eq!(
            tls_outcome_from_error(&expired),
            Some(RawTlsOutcome::BadChain)
        );
    }

    #[test]
    fn test_tls_outcome_from_error_no_tls_cause() {
        let plain = io::Error::new(io::ErrorKind::ConnectionRefused, "refused");
        assert_eq!(tls_outcome_from_error(&plain), None);
    }

    #[test]
    fn test_normalize_headers_lowercases_names() {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::HeaderName::from_static("strict-transport-security"),
            reqwest::header::HeaderValue::from_static("max-age=31536000"),
        );
        headers.insert(
            reqwest::header::HeaderName::from_bytes(b"X-Custom").unwrap(),
            reqwest::header::HeaderValue::from_static("v"),
        );

        let normalized = normalize_headers(&headers);
        assert_eq!(
            normalized.get("strict-transport-security").map(String::as_str),
            Some("max-age=31536000")
        );
        assert_eq!(normalized.get("x-custom").map(String::as_str), Some("v"));
    }
}
