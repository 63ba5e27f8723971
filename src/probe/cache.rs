//! Injected probe-response cache.
//!
//! The prober consults an optional cache before touching the network and
//! populates it afterwards. The cache is an explicit dependency handed to
//! the `Prober` at construction time; there is no ambient global state.
//!
//! The key includes both TLS verification axes and the redirect flag: the
//! same URL probed with different verification settings yields different
//! outcomes, and conflating them would poison the TLS classifier.

use std::collections::HashMap;
use std::sync::Mutex;

use url::Url;

use super::{ProbeOutcome, VerifyMode};

/// The request signature a cached probe outcome is stored under.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProbeCacheKey {
    /// HTTP method of the probe (always `GET` today).
    pub method: String,
    /// The exact URL issued.
    pub url: String,
    /// Whether redirects were followed.
    pub follow_redirects: bool,
    /// Whether the certificate chain was verified.
    pub verify_chain: bool,
    /// Whether the certificate hostname was verified.
    pub verify_hostname: bool,
}

impl ProbeCacheKey {
    /// Builds the cache key for a probe request.
    pub fn new(url: &Url, follow_redirects: bool, verify: VerifyMode) -> Self {
        Self {
            method: "GET".to_string(),
            url: url.to_string(),
            follow_redirects,
            verify_chain: verify.verify_chain(),
            verify_hostname: verify.verify_hostname(),
        }
    }
}

/// A cache of probe outcomes keyed by request signature.
///
/// Implementations must be safe to share across the four concurrent
/// endpoint evaluations of a single inspection.
pub trait ProbeCache: Send + Sync {
    /// Returns the cached outcome for `key`, if any.
    fn get(&self, key: &ProbeCacheKey) -> Option<ProbeOutcome>;
    /// Stores `outcome` under `key`, replacing any previous entry.
    fn put(&self, key: ProbeCacheKey, outcome: ProbeOutcome);
}

/// A simple in-process `ProbeCache` backed by a mutex-guarded map.
#[derive(Debug, Default)]
pub struct InMemoryProbeCache {
    entries: Mutex<HashMap<ProbeCacheKey, ProbeOutcome>>,
}

impl InMemoryProbeCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of cached outcomes.
    pub fn len(&self) -> usize {
        self.entries.lock().expect("probe cache poisoned").len()
    }

    /// Whether the cache holds no outcomes.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ProbeCache for InMemoryProbeCache {
    fn get(&self, key: &ProbeCacheKey) -> Option<ProbeOutcome> {
        self.entries
            .lock()
            .expect("probe cache poisoned")
            .get(key)
            .cloned()
    }

    fn put(&self, key: ProbeCacheKey, outcome: ProbeOutcome) {
        self.entries
            .lock()
            .expect("probe cache poisoned")
            .insert(key, outcome);
    }
}
