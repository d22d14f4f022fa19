//! SKPort API client
//!
//! This module wraps the HTTP transport used by every step of a check-in:
//! - Base URLs for the account service and the SKPort API (overridable for tests)
//! - A global request rate limiter (governor)
//! - JSON envelope decoding for both upstream response shapes
//! - Signed GET/POST helpers that sign each request independently

pub mod attendance;
pub mod auth;
pub mod binding;
pub mod headers;
pub mod sign;

use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use reqwest::{header::HeaderMap, Client, RequestBuilder};
use serde::{de::DeserializeOwned, Deserialize};
use std::num::NonZeroU32;

use crate::config::ApiConfig;
use crate::error::{Error, Result};
use crate::models::SessionCredential;
use headers::{build_signed_headers, unix_timestamp, ClientProfile, SignedHeaders};

pub use attendance::AttendanceClaimer;
pub use auth::{CredentialProvider, DirectCredential, TokenExchange};
pub use binding::RoleResolver;

/// Envelope used by the account service (`status` / `msg`)
#[derive(Debug, Deserialize)]
pub struct AccountEnvelope<T> {
    #[serde(default = "unknown_code")]
    pub status: i64,
    pub msg: Option<String>,
    pub data: Option<T>,
}

/// Envelope used by the SKPort API (`code` / `message`)
#[derive(Debug, Deserialize)]
pub struct ApiEnvelope<T> {
    #[serde(default = "unknown_code")]
    pub code: i64,
    pub message: Option<String>,
    pub data: Option<T>,
}

// A body without a status field must not read as success.
fn unknown_code() -> i64 {
    -1
}

/// Decoded response together with its raw body
#[derive(Debug)]
pub struct Reply<T> {
    pub body: T,
    pub raw: String,
}

/// Pick the upstream message, falling back to the raw body
pub(crate) fn message_or_raw(message: Option<&str>, raw: &str) -> String {
    match message {
        Some(m) if !m.is_empty() => m.to_string(),
        _ => raw.to_string(),
    }
}

/// HTTP client for the SKPort and account services
pub struct SkportClient {
    /// HTTP client with configured timeout
    client: Client,

    /// Rate limiter shared by all outbound requests
    rate_limiter: Option<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>,

    /// Base URL of the SKPort API
    api_base_url: String,

    /// Base URL of the account service
    account_base_url: String,

    /// Client identity used for headers and signatures
    profile: ClientProfile,
}

impl SkportClient {
    /// Create a new client from API configuration
    ///
    /// # Errors
    ///
    /// Returns `Error::Http` if the HTTP client cannot be created
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let client = Client::builder().timeout(config.request_timeout()).build()?;

        let rate_limiter = NonZeroU32::new(config.requests_per_second)
            .map(|rate| RateLimiter::direct(Quota::per_second(rate)));

        Ok(Self {
            client,
            rate_limiter,
            api_base_url: config.api_base_url.trim_end_matches('/').to_string(),
            account_base_url: config.account_base_url.trim_end_matches('/').to_string(),
            profile: config.profile(),
        })
    }

    pub fn profile(&self) -> &ClientProfile {
        &self.profile
    }

    /// Full URL of a SKPort API path
    pub fn api_url(&self, path: &str) -> String {
        format!("{}{path}", self.api_base_url)
    }

    /// Full URL of an account service path
    pub fn account_url(&self, path: &str) -> String {
        format!("{}{path}", self.account_base_url)
    }

    pub(crate) fn http(&self) -> &Client {
        &self.client
    }

    /// Send a request and decode its JSON body
    ///
    /// The HTTP status is not checked: the upstream reports failures through
    /// the code embedded in the body.
    pub async fn execute<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<Reply<T>> {
        if let Some(limiter) = &self.rate_limiter {
            limiter.until_ready().await;
        }

        let response = request.send().await?;
        let status = response.status();
        let raw = response.text().await?;

        let body = serde_json::from_str(&raw).map_err(|e| {
            tracing::debug!(status = %status, body = %raw, "Undecodable response body");
            Error::Json(e)
        })?;

        Ok(Reply { body, raw })
    }

    /// Build fresh signed headers for `path`
    pub fn signed_headers(
        &self,
        session: &SessionCredential,
        path: &str,
        game_role: Option<&str>,
    ) -> Result<SignedHeaders> {
        build_signed_headers(
            &self.profile,
            path,
            &unix_timestamp(),
            &session.credential,
            &session.secret,
            game_role,
        )
    }

    /// Signed GET against the SKPort API
    pub async fn signed_get<T: DeserializeOwned>(
        &self,
        session: &SessionCredential,
        path: &str,
        game_role: Option<&str>,
    ) -> Result<Reply<ApiEnvelope<T>>> {
        let signed = self.signed_headers(session, path, game_role)?;
        tracing::debug!(path = %path, timestamp = %signed.timestamp, signed = signed.is_signed(), "GET");
        let request = self.client.get(self.api_url(path)).headers(signed.headers);
        self.execute(request).await
    }

    /// Signed POST with an empty body against the SKPort API
    pub async fn signed_post<T: DeserializeOwned>(
        &self,
        session: &SessionCredential,
        path: &str,
        game_role: Option<&str>,
    ) -> Result<Reply<ApiEnvelope<T>>> {
        let signed = self.signed_headers(session, path, game_role)?;
        tracing::debug!(path = %path, timestamp = %signed.timestamp, signed = signed.is_signed(), "POST");
        let request = self.client.post(self.api_url(path)).headers(signed.headers);
        self.execute(request).await
    }

    /// Plain JSON POST without session headers
    pub(crate) fn post_json(
        &self,
        url: &str,
        headers: HeaderMap,
        body: &serde_json::Value,
    ) -> RequestBuilder {
        self.client.post(url).headers(headers).json(body)
    }
}
