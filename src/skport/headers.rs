//! Request headers for the SKPort API
//!
//! Signed requests carry the session `cred`, the client profile and a fresh
//! `timestamp`, plus `sign` when the session has a secret.

use reqwest::header::{
    HeaderMap, HeaderName, HeaderValue, ACCEPT, CONTENT_TYPE, ORIGIN, REFERER, USER_AGENT,
};

use super::sign::sign;
use crate::error::{Error, Result};

/// User agent of the official Android SKPort app
pub const SKPORT_USER_AGENT: &str =
    "Skport/0.7.0 (com.gryphline.skport; build:700089; Android 33; ) Okhttp/5.1.0";

const GAME_ORIGIN: &str = "https://game.skport.com";
const GAME_REFERER: &str = "https://game.skport.com/";
const WEB_ORIGIN: &str = "https://www.skport.com";
const WEB_REFERER: &str = "https://www.skport.com/";

/// Client identity folded into every signed request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientProfile {
    /// `platform` header and signature field
    pub platform: String,
    /// `vname` header and signature field
    pub version_name: String,
    /// `sk-language` header
    pub language: String,
    /// `User-Agent` header
    pub user_agent: String,
}

impl Default for ClientProfile {
    fn default() -> Self {
        Self {
            platform: "3".to_string(),
            version_name: "1.0.0".to_string(),
            language: "en".to_string(),
            user_agent: SKPORT_USER_AGENT.to_string(),
        }
    }
}

/// Headers of one signed request together with the values they were built from
#[derive(Debug, Clone)]
pub struct SignedHeaders {
    pub path: String,
    pub timestamp: String,
    pub signature: Option<String>,
    pub headers: HeaderMap,
}

impl SignedHeaders {
    pub fn is_signed(&self) -> bool {
        self.signature.is_some()
    }
}

/// Current Unix time in seconds, as sent in the `timestamp` header
pub fn unix_timestamp() -> String {
    chrono::Utc::now().timestamp().to_string()
}

fn header_value(name: &str, value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|_| Error::config(format!("value for header '{name}' is not valid ASCII")))
}

/// Build headers for a signed SKPort API request
///
/// The signature is computed from `path`, `timestamp` and `secret`; it is
/// left out when `secret` is empty.
///
/// # Examples
///
/// ```
/// use endfield_checkin::skport::headers::{build_signed_headers, ClientProfile};
///
/// let signed = build_signed_headers(
///     &ClientProfile::default(),
///     "/api/v1/game/player/binding",
///     "1700000000",
///     "cred-value",
///     "secret-value",
///     None,
/// )
/// .unwrap();
/// assert!(signed.headers.contains_key("sign"));
/// assert!(!signed.headers.contains_key("sk-game-role"));
/// ```
pub fn build_signed_headers(
    profile: &ClientProfile,
    path: &str,
    timestamp: &str,
    credential: &str,
    secret: &str,
    game_role: Option<&str>,
) -> Result<SignedHeaders> {
    let mut headers = HeaderMap::new();

    headers.insert(
        ACCEPT,
        HeaderValue::from_static("application/json, text/plain, */*"),
    );
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(ORIGIN, HeaderValue::from_static(GAME_ORIGIN));
    headers.insert(REFERER, HeaderValue::from_static(GAME_REFERER));
    headers.insert(
        HeaderName::from_static("cred"),
        header_value("cred", credential)?,
    );
    headers.insert(
        HeaderName::from_static("platform"),
        header_value("platform", &profile.platform)?,
    );
    headers.insert(
        HeaderName::from_static("sk-language"),
        header_value("sk-language", &profile.language)?,
    );
    headers.insert(
        HeaderName::from_static("timestamp"),
        header_value("timestamp", timestamp)?,
    );
    headers.insert(
        HeaderName::from_static("vname"),
        header_value("vname", &profile.version_name)?,
    );
    headers.insert(USER_AGENT, header_value("user-agent", &profile.user_agent)?);

    if let Some(role) = game_role {
        headers.insert(
            HeaderName::from_static("sk-game-role"),
            header_value("sk-game-role", role)?,
        );
    }

    let signature = sign(
        path,
        timestamp,
        secret,
        &profile.platform,
        &profile.version_name,
    )?;
    match &signature {
        Some(sig) => {
            headers.insert(HeaderName::from_static("sign"), header_value("sign", sig)?);
        }
        None => {
            tracing::warn!(path = %path, "No secret available, sending unsigned request");
        }
    }

    Ok(SignedHeaders {
        path: path.to_string(),
        timestamp: timestamp.to_string(),
        signature,
        headers,
    })
}

/// Build headers for the credential-generation step of the handshake
pub fn build_cred_exchange_headers(profile: &ClientProfile) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();

    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(
        HeaderName::from_static("platform"),
        header_value("platform", &profile.platform)?,
    );
    headers.insert(REFERER, HeaderValue::from_static(WEB_REFERER));
    headers.insert(ORIGIN, HeaderValue::from_static(WEB_ORIGIN));

    Ok(headers)
}
