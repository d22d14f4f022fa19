//! Session credential strategies
//!
//! A run needs one [`SessionCredential`] per account. Two strategies produce
//! it behind the same trait:
//!
//! - [`TokenExchange`] turns a long-lived account token into a session via
//!   the three-step handshake (basic info, OAuth grant, cred generation).
//! - [`DirectCredential`] hands back a `cred`/secret pair obtained elsewhere.
//!
//! The handshake never retries. A failure at step N is reported as
//! `Error::Handshake { step: N, .. }` and no request for a later step is sent.

use async_trait::async_trait;
use reqwest::header::{HeaderValue, ACCEPT};
use serde::Deserialize;
use serde_json::json;

use super::headers::build_cred_exchange_headers;
use super::{message_or_raw, AccountEnvelope, ApiEnvelope, SkportClient};
use crate::error::{Error, Result};
use crate::models::SessionCredential;

/// Application code of SKPort on the account service
pub const SKPORT_APP_CODE: &str = "6eb76d4e13aa36e6";

pub const BASIC_INFO_PATH: &str = "/user/info/v1/basic";
pub const OAUTH_GRANT_PATH: &str = "/user/oauth2/v2/grant";
pub const GENERATE_CRED_PATH: &str = "/web/v1/user/auth/generate_cred_by_code";

/// Produces the session used for every signed request of one account
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    /// Strategy name, for logs
    fn name(&self) -> &str;

    /// Obtain a fresh session
    async fn session(&self, client: &SkportClient) -> Result<SessionCredential>;
}

#[derive(Debug, Deserialize)]
struct GrantData {
    code: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CredData {
    cred: Option<String>,
    token: Option<String>,
    user_id: Option<serde_json::Value>,
}

/// Render a JSON scalar id as a plain string
fn id_string(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Handshake strategy: account token → session
pub struct TokenExchange {
    token: String,
}

impl TokenExchange {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }

    /// Run the full three-step handshake for `token`
    pub async fn exchange(client: &SkportClient, token: &str) -> Result<SessionCredential> {
        if token.is_empty() {
            return Err(Error::handshake(1, "No account token supplied"));
        }

        Self::validate_token(client, token).await?;
        tracing::debug!(step = 1, "Account token validated");

        let code = Self::grant_code(client, token).await?;
        tracing::debug!(step = 2, "OAuth code granted");

        let session = Self::generate_cred(client, &code).await?;
        tracing::debug!(step = 3, user_id = %session.user_id, "Session credential generated");

        Ok(session)
    }

    /// Step 1: validate the token against the basic-info endpoint
    async fn validate_token(client: &SkportClient, token: &str) -> Result<()> {
        let request = client
            .http()
            .get(client.account_url(BASIC_INFO_PATH))
            .query(&[("token", token)])
            .header(ACCEPT, HeaderValue::from_static("application/json"));

        let reply = client
            .execute::<AccountEnvelope<serde_json::Value>>(request)
            .await
            .map_err(|e| Error::handshake(1, e.to_string()))?;

        if reply.body.status != 0 {
            return Err(Error::handshake(
                1,
                message_or_raw(reply.body.msg.as_deref(), &reply.raw),
            ));
        }

        Ok(())
    }

    /// Step 2: exchange the token for a short-lived OAuth code
    async fn grant_code(client: &SkportClient, token: &str) -> Result<String> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        let body = json!({ "token": token, "appCode": SKPORT_APP_CODE, "type": 0 });

        let request = client.post_json(&client.account_url(OAUTH_GRANT_PATH), headers, &body);
        let reply = client
            .execute::<AccountEnvelope<GrantData>>(request)
            .await
            .map_err(|e| Error::handshake(2, e.to_string()))?;

        let code = reply
            .body
            .data
            .and_then(|d| d.code)
            .filter(|c| !c.is_empty());

        match code {
            Some(code) if reply.body.status == 0 => Ok(code),
            _ => Err(Error::handshake(
                2,
                message_or_raw(reply.body.msg.as_deref(), &reply.raw),
            )),
        }
    }

    /// Step 3: exchange the OAuth code for `cred` and its signing secret
    async fn generate_cred(client: &SkportClient, code: &str) -> Result<SessionCredential> {
        let headers = build_cred_exchange_headers(client.profile())?;
        let body = json!({ "code": code, "kind": 1 });

        let request = client.post_json(&client.api_url(GENERATE_CRED_PATH), headers, &body);
        let reply = client
            .execute::<ApiEnvelope<CredData>>(request)
            .await
            .map_err(|e| Error::handshake(3, e.to_string()))?;

        let failure = || {
            Error::handshake(
                3,
                message_or_raw(reply.body.message.as_deref(), &reply.raw),
            )
        };

        if reply.body.code != 0 {
            return Err(failure());
        }

        let data = reply.body.data.as_ref().ok_or_else(failure)?;
        let credential = data
            .cred
            .clone()
            .filter(|c| !c.is_empty())
            .ok_or_else(failure)?;

        Ok(SessionCredential {
            credential,
            secret: data.token.clone().unwrap_or_default(),
            user_id: data.user_id.as_ref().map(id_string).unwrap_or_default(),
        })
    }
}

#[async_trait]
impl CredentialProvider for TokenExchange {
    fn name(&self) -> &str {
        "token-exchange"
    }

    async fn session(&self, client: &SkportClient) -> Result<SessionCredential> {
        Self::exchange(client, &self.token).await
    }
}

/// Direct-injection strategy: a pre-obtained `cred` and secret
pub struct DirectCredential {
    session: SessionCredential,
}

impl DirectCredential {
    pub fn new(credential: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            session: SessionCredential::new(credential, secret, ""),
        }
    }
}

#[async_trait]
impl CredentialProvider for DirectCredential {
    fn name(&self) -> &str {
        "direct"
    }

    async fn session(&self, _client: &SkportClient) -> Result<SessionCredential> {
        Ok(self.session.clone())
    }
}
