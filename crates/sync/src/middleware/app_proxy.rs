//! Shopify App Proxy signature verification.
//!
//! When the storefront calls the endpoint through an App Proxy, Shopify
//! appends `signature` to the query string: the hex HMAC-SHA256 of every
//! other parameter, sorted by key, rendered as `key=value` (repeated keys
//! joined with `,`) and concatenated without separators.

use std::collections::BTreeMap;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::error::SyncError;
use crate::state::AppState;

type HmacSha256 = Hmac<Sha256>;

const SIGNATURE_PARAM: &str = "signature";

/// Reject unsigned or mis-signed requests when an App Proxy secret is set.
///
/// Without a configured secret every request passes through.
///
/// # Errors
///
/// Returns `SyncError::Unauthorized` if the signature is missing or wrong.
pub async fn require_app_proxy_signature(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, SyncError> {
    if let Some(secret) = state.config().app_proxy_secret() {
        let query = request.uri().query().unwrap_or_default();

        if !verify_app_proxy_signature(query, secret) {
            return Err(SyncError::Unauthorized(
                "Invalid App Proxy signature.".to_string(),
            ));
        }
    }

    Ok(next.run(request).await)
}

/// Check the `signature` parameter of an App Proxy query string.
#[must_use]
pub fn verify_app_proxy_signature(query: &str, secret: &str) -> bool {
    let mut params: BTreeMap<String, Vec<String>> = BTreeMap::new();
    let mut provided = None;

    for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
        if key == SIGNATURE_PARAM {
            provided = Some(value.into_owned());
        } else {
            params
                .entry(key.into_owned())
                .or_default()
                .push(value.into_owned());
        }
    }

    let Some(provided) = provided else {
        return false;
    };

    let Some(expected) = sign(&params, secret) else {
        return false;
    };

    constant_time_compare(&expected, &provided.to_ascii_lowercase())
}

/// Hex HMAC-SHA256 of the canonical parameter string.
fn sign(params: &BTreeMap<String, Vec<String>>, secret: &str) -> Option<String> {
    let message: String = params
        .iter()
        .map(|(key, values)| format!("{key}={}", values.join(",")))
        .collect();

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).ok()?;
    mac.update(message.as_bytes());

    Some(hex::encode(mac.finalize().into_bytes()))
}

/// Constant-time string comparison to prevent timing attacks.
fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result: u8 = 0;
    for (x, y) in a.bytes().zip(b.bytes()) {
        result |= x ^ y;
    }

    result == 0
}
