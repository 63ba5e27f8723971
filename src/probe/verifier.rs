//! Certificate verification with independently toggleable axes.
//!
//! The TLS classifier needs to distinguish "untrusted chain" from "wrong
//! hostname", which requires probing with one verification axis disabled
//! while the other stays active. rustls only exposes all-or-nothing
//! verification, so this module wraps the stock webpki verifier in a
//! verifier that can skip either axis.
//!
//! Invariant: with the chain axis disabled, the hostname axis is still
//! enforced against the end-entity certificate (and vice versa the stock
//! verifier enforces the chain before the name), so each axis reports
//! independently.

use std::sync::Arc;

use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::client::{verify_server_name, WebPkiServerVerifier};
use rustls::server::ParsedCertificate;
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{
    CertificateError, ClientConfig, DigitallySignedStruct, Error as TlsError, RootCertStore,
    SignatureScheme,
};

use crate::error_handling::InitializationError;

use super::VerifyMode;

/// Reports whether a rustls error is a hostname-mismatch failure.
pub(crate) fn is_hostname_error(err: &TlsError) -> bool {
    matches!(
        err,
        TlsError::InvalidCertificate(
            CertificateError::NotValidForName | CertificateError::NotValidForNameContext { .. }
        )
    )
}

/// Server certificate verifier with separately switchable chain and
/// hostname checks.
#[derive(Debug)]
struct AxisVerifier {
    inner: Arc<WebPkiServerVerifier>,
    verify_chain: bool,
    verify_hostname: bool,
}

impl ServerCertVerifier for AxisVerifier {
    fn verify_server_cert(
        &self,
        end_entity: &CertificateDer<'_>,
        intermediates: &[CertificateDer<'_>],
        server_name: &ServerName<'_>,
        ocsp_response: &[u8],
        now: UnixTime,
    ) -> Result<ServerCertVerified, TlsError> {
        if self.verify_chain {
            // The stock verifier checks the chain first and the name last,
            // so a hostname error here means the chain already passed.
            match self.inner.verify_server_cert(
                end_entity,
                intermediates,
                server_name,
                ocsp_response,
                now,
            ) {
                Ok(verified) => Ok(verified),
                Err(err) if is_hostname_error(&err) && !self.verify_hostname => {
                    Ok(ServerCertVerified::assertion())
                }
                Err(err) => Err(err),
            }
        } else {
            if self.verify_hostname {
                let parsed = ParsedCertificate::try_from(end_entity)?;
                verify_server_name(&parsed, server_name)?;
            }
            Ok(ServerCertVerified::assertion())
        }
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, TlsError> {
        self.inner.verify_tls12_signature(message, cert, dss)
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, TlsError> {
        self.inner.verify_tls13_signature(message, cert, dss)
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.inner.supported_verify_schemes()
    }
}

/// Builds the rustls client configuration for one verification mode.
///
/// All modes share the webpki root store (Mozilla roots via `webpki-roots`);
/// the mode only controls which failure axes are tolerated.
pub(crate) fn client_tls_config(
    roots: Arc<RootCertStore>,
    mode: VerifyMode,
) -> Result<ClientConfig, InitializationError> {
    let inner = WebPkiServerVerifier::builder(roots)
        .build()
        .map_err(|e| InitializationError::TlsVerifierError(e.to_string()))?;

    let verifier = AxisVerifier {
        inner,
        verify_chain: mode.verify_chain(),
        verify_hostname: mode.verify_hostname(),
    };

    Ok(ClientConfig::builder()
        .dangerous()
        .with_custom_certificate_verifier(Arc::new(verifier))
        .with_no_client_auth())
}
