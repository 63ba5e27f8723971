//! Endpoint identity and per-endpoint observation records.
//!
//! A domain is probed at exactly four endpoints: HTTP/HTTPS crossed with
//! root/www. `EndpointKey` names one of them, `EndpointRecord` is the
//! complete observation for one of them, and `EndpointRecords` is the
//! per-inspection arena holding all four.

use std::fmt;

use serde::Serialize;
use strum::IntoEnumIterator;
use strum_macros::EnumIter;
use url::Url;

use crate::config::{InspectionConfig, DEFAULT_HTTPS_PORT, DEFAULT_HTTP_PORT};
use crate::error_handling::DomainError;
use crate::hsts::HstsDetail;
use crate::probe::Headers;
use crate::redirect::RedirectDetail;
use crate::tls::TlsDetail;

/// Probe protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    /// Plain HTTP.
    Http,
    /// HTTP over TLS.
    Https,
}

impl Protocol {
    /// The URL scheme for this protocol.
    pub fn scheme(self) -> &'static str {
        match self {
            Protocol::Http => "http",
            Protocol::Https => "https",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.scheme())
    }
}

/// Probe subdomain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Subdomain {
    /// The apex, no subdomain (e.g. `example.org`).
    Root,
    /// The `www.` host (e.g. `www.example.org`).
    Www,
}

impl Subdomain {
    /// The hostname this subdomain produces for `domain`.
    pub fn host_for(self, domain: &str) -> String {
        match self {
            Subdomain::Root => domain.to_string(),
            Subdomain::Www => format!("www.{domain}"),
        }
    }
}

impl fmt::Display for Subdomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Subdomain::Root => "root",
            Subdomain::Www => "www",
        })
    }
}

/// One of the four probe targets of a domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct EndpointKey {
    /// Protocol axis.
    pub protocol: Protocol,
    /// Subdomain axis.
    pub subdomain: Subdomain,
}

impl EndpointKey {
    /// Creates a key from its two axes.
    pub const fn new(protocol: Protocol, subdomain: Subdomain) -> Self {
        Self {
            protocol,
            subdomain,
        }
    }

    /// All four keys in deterministic order: HTTP before HTTPS, root
    /// before www.
    pub fn all() -> [EndpointKey; 4] {
        let mut keys = [EndpointKey::new(Protocol::Http, Subdomain::Root); 4];
        let mut i = 0;
        for protocol in Protocol::iter() {
            for subdomain in Subdomain::iter() {
                keys[i] = EndpointKey::new(protocol, subdomain);
                i += 1;
            }
        }
        keys
    }

    /// Builds the probe URL for this endpoint of `domain`, honoring the
    /// configured probe ports (the port is omitted when it is the
    /// protocol's default).
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Unparseable` when the resulting URL is not a
    /// valid host, which only happens for malformed input domains.
    pub fn url_for(&self, domain: &str, config: &InspectionConfig) -> Result<Url, DomainError> {
        let host = self.subdomain.host_for(domain);
        let (port, default_port) = match self.protocol {
            Protocol::Http => (config.http_port, DEFAULT_HTTP_PORT),
            Protocol::Https => (config.https_port, DEFAULT_HTTPS_PORT),
        };
        let rendered = if port == default_port {
            format!("{}://{}/", self.protocol.scheme(), host)
        } else {
            format!("{}://{}:{}/", self.protocol.scheme(), host, port)
        };
        Url::parse(&rendered).map_err(|_| DomainError::Unparseable(host))
    }
}

impl fmt::Display for EndpointKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.protocol, self.subdomain)
    }
}

/// The complete observation for one endpoint. Computed once per
/// inspection and never mutated afterwards; `up = false` short-circuits
/// every derived field to its default.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EndpointRecord {
    /// Which endpoint this record describes.
    pub key: EndpointKey,
    /// The URL that was probed.
    pub url: Url,
    /// Whether the endpoint answered at all.
    pub up: bool,
    /// HTTP status code; 0 when unreachable.
    pub status: u16,
    /// Response headers, lower-cased.
    pub headers: Headers,
    /// TLS posture; present for HTTPS endpoints only.
    pub tls: Option<TlsDetail>,
    /// The honored HSTS policy (all-default unless this is a TLS-valid
    /// HTTPS endpoint).
    pub hsts: HstsDetail,
    /// The raw `Strict-Transport-Security` header as observed, honored or
    /// not.
    pub hsts_header: Option<String>,
    /// Redirect classification; present when the response was a 3xx with
    /// a usable `Location` header.
    pub redirect: Option<RedirectDetail>,
}

impl EndpointRecord {
    /// A record for an endpoint that did not answer.
    pub(crate) fn down(key: EndpointKey, url: Url, tls: Option<TlsDetail>) -> Self {
        Self {
            key,
            url,
            up: false,
            status: 0,
            headers: Headers::new(),
            tls,
            hsts: HstsDetail::default(),
            hsts_header: None,
            redirect: None,
        }
    }

    /// Whether this endpoint's response was a redirect.
    pub fn is_redirect(&self) -> bool {
        self.redirect.is_some()
    }

    /// Whether this endpoint's certificate fails hostname verification.
    /// Always `false` for HTTP endpoints.
    pub fn bad_hostname(&self) -> bool {
        self.tls.as_ref().is_some_and(|t| t.bad_hostname)
    }

    /// Whether this endpoint negotiated TLS under full verification.
    /// Always `false` for HTTP endpoints.
    pub fn tls_valid(&self) -> bool {
        self.tls.as_ref().is_some_and(|t| t.valid)
    }
}

/// The four endpoint records of one inspection, indexed by key.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EndpointRecords {
    /// HTTP at the apex.
    pub http_root: EndpointRecord,
    /// HTTP at the www host.
    pub http_www: EndpointRecord,
    /// HTTPS at the apex.
    pub https_root: EndpointRecord,
    /// HTTPS at the www host.
    pub https_www: EndpointRecord,
}

impl EndpointRecords {
    /// Looks up the record for `key`.
    pub fn get(&self, key: EndpointKey) -> &EndpointRecord {
        match (key.protocol, key.subdomain) {
            (Protocol::Http, Subdomain::Root) => &self.http_root,
            (Protocol::Http, Subdomain::Www) => &self.http_www,
            (Protocol::Https, Subdomain::Root) => &self.https_root,
            (Protocol::Https, Subdomain::Www) => &self.https_www,
        }
    }

    /// Iterates the four records in key order.
    pub fn iter(&self) -> impl Iterator<Item = &EndpointRecord> {
        [
            &self.http_root,
            &self.http_www,
            &self.https_root,
            &self.https_www,
        ]
        .into_iter()
    }
}
