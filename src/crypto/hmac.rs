//! HMAC-SHA256 request signing for the signed facilitator variant

use crate::{Result, X402Error};
use base64::{engine::general_purpose, Engine as _};
use chrono::{DateTime, SecondsFormat, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Format a timestamp the way the signed API expects: ISO-8601, UTC, milliseconds
/// (`2024-05-01T12:00:00.000Z`).
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Build the exact string that gets signed
pub fn prehash(timestamp: &str, method: &str, request_path: &str, body: &str) -> String {
    format!("{}{}{}{}", timestamp, method, request_path, body)
}

/// Sign `timestamp + method + request_path + body` with the secret key.
/// Returns the base64-encoded MAC.
pub fn sign_request(
    secret_key: &str,
    timestamp: &str,
    method: &str,
    request_path: &str,
    body: &str,
) -> Result<String> {
    let mut mac = HmacSha256::new_from_slice(secret_key.as_bytes())
        .map_err(|e| X402Error::config(format!("Invalid HMAC key: {}", e)))?;
    mac.update(prehash(timestamp, method, request_path, body).as_bytes());
    Ok(general_purpose::STANDARD.encode(mac.finalize().into_bytes()))
}
