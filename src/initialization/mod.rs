//! Library initialization helpers.
//!
//! This module provides functions to initialize shared process-level
//! resources:
//! - The logger (with custom formatting)
//! - The rustls crypto provider (required before any TLS probe)

mod logger;

use rustls::crypto::{ring::default_provider, CryptoProvider};

// Re-export public API
pub use logger::init_logger_with;

/// Initializes the crypto provider for TLS operations.
///
/// Configures the global crypto provider for `rustls`. This must be called
/// before any TLS probes are issued; `Inspector::new` calls it on behalf of
/// embedding applications.
pub fn init_crypto_provider() {
    // The return value is ignored because reinstalling the provider is harmless
    let _ = CryptoProvider::install_default(default_provider());
}
