//! Endpoint evaluation.
//!
//! Orchestrates one endpoint's probe sequence into a complete
//! `EndpointRecord`: non-following probe (with TLS classification for
//! HTTPS), HSTS parsing, and redirect resolution. The four endpoints of a
//! domain are evaluated independently; each evaluation owns its own
//! probe/re-probe sequence and shares no mutable state with its siblings.

use log::debug;

use crate::endpoint::{EndpointKey, EndpointRecord, Protocol};
use crate::error_handling::DomainError;
use crate::hsts::{self, HstsDetail};
use crate::probe::{Prober, VerifyMode};
use crate::redirect;
use crate::tls;

/// Evaluates one endpoint of `domain`.
///
/// # Errors
///
/// Fails only when `domain` cannot be rendered into a probe URL; network
/// failures are encoded in the returned record (`up = false`), never
/// returned as errors.
pub(crate) async fn evaluate_endpoint(
    prober: &Prober,
    domain: &str,
    key: EndpointKey,
) -> Result<EndpointRecord, DomainError> {
    let url = key.url_for(domain, prober.config())?;
    debug!("evaluating {key} endpoint at {url}");

    let (outcome, tls_detail, safe_mode) = match key.protocol {
        Protocol::Http => {
            let outcome = prober.probe(&url, false, VerifyMode::Full).await;
            (outcome, None, VerifyMode::Full)
        }
        Protocol::Https => {
            let classified = tls::classify(prober, &url).await;
            (
                classified.outcome,
                Some(classified.detail),
                classified.safe_mode,
            )
        }
    };

    if !outcome.is_up() {
        debug!("{key} endpoint of {domain} is unreachable");
        return Ok(EndpointRecord::down(key, url, tls_detail));
    }

    let hsts_header = outcome
        .header("strict-transport-security")
        .map(str::to_string);

    // HSTS carried over plain HTTP or invalid TLS must never be honored;
    // the raw header is still recorded for reporting
    let honor_hsts =
        key.protocol == Protocol::Https && tls_detail.as_ref().is_some_and(|t| t.valid);
    let hsts_detail = if honor_hsts {
        hsts::parse(hsts_header.as_deref())
    } else {
        HstsDetail::default()
    };

    let redirect_detail = if (300..400).contains(&outcome.status) {
        redirect::resolve(prober, &outcome, safe_mode).await
    } else {
        None
    };

    Ok(EndpointRecord {
        key,
        url,
        up: true,
        status: outcome.status,
        headers: outcome.headers,
        tls: tls_detail,
        hsts: hsts_detail,
        hsts_header,
        redirect: redirect_detail,
    })
}
