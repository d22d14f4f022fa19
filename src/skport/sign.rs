//! SKPort V2 request signature
//!
//! `sign = hex(MD5(hex(HMAC-SHA256(secret, path + timestamp + aux_json))))`
//!
//! `aux_json` is `{"platform":..,"timestamp":..,"dId":"","vName":..}` with
//! exactly that key order and no whitespace. The server rebuilds the same
//! string, so any byte of difference fails authentication.

use hmac::{Hmac, Mac};
use md5::{Digest, Md5};
use sha2::Sha256;

use crate::error::{Error, Result};

type HmacSha256 = Hmac<Sha256>;

/// JSON string literal for `value`, with quotes and escapes
fn json_str(value: &str) -> String {
    serde_json::Value::from(value).to_string()
}

/// Build the exact string that gets signed
pub fn signing_string(path: &str, timestamp: &str, platform: &str, version_name: &str) -> String {
    format!(
        r#"{path}{timestamp}{{"platform":{},"timestamp":{},"dId":"","vName":{}}}"#,
        json_str(platform),
        json_str(timestamp),
        json_str(version_name),
    )
}

/// Compute the request signature.
///
/// Returns `Ok(None)` when `secret` is empty; the request then goes out unsigned.
///
/// # Errors
///
/// `Error::Signing` if the secret is rejected as an HMAC key.
pub fn sign(
    path: &str,
    timestamp: &str,
    secret: &str,
    platform: &str,
    version_name: &str,
) -> Result<Option<String>> {
    if secret.is_empty() {
        return Ok(None);
    }

    let message = signing_string(path, timestamp, platform, version_name);

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| Error::Signing(e.to_string()))?;
    mac.update(message.as_bytes());
    let hmac_hex = hex::encode(mac.finalize().into_bytes());

    Ok(Some(hex::encode(Md5::digest(hmac_hex.as_bytes()))))
}
