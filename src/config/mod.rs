//! Configuration management for endfield-checkin
//!
//! This module loads and validates configuration from environment variables
//! or a TOML file. Account secrets are the only required input.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::skport::headers::{ClientProfile, SKPORT_USER_AGENT};

pub const DEFAULT_API_BASE_URL: &str = "https://zonai.skport.com";
pub const DEFAULT_ACCOUNT_BASE_URL: &str = "https://as.gryphline.com";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Accounts to check in, processed in order
    #[serde(default)]
    pub accounts: Vec<AccountSource>,

    /// Upstream API configuration
    #[serde(default)]
    pub api: ApiConfig,

    /// Delays between roles and accounts
    #[serde(default)]
    pub pacing: PacingConfig,

    /// Notification configuration
    #[serde(default)]
    pub notify: NotifyConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// How an account obtains its session
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AccountSource {
    /// Long-lived account token, exchanged via the OAuth handshake
    Token { token: String },
    /// Pre-obtained `cred` and signing secret
    Credential { cred: String, secret: String },
}

impl fmt::Debug for AccountSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Token { .. } => f.write_str("Token { token: <redacted> }"),
            Self::Credential { cred, .. } => f
                .debug_struct("Credential")
                .field("cred", cred)
                .field("secret", &"<redacted>")
                .finish(),
        }
    }
}

/// Upstream API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// SKPort API base URL
    pub api_base_url: String,

    /// Account service base URL
    pub account_base_url: String,

    /// `platform` header and signature field
    pub platform: String,

    /// `vname` header and signature field
    pub version_name: String,

    /// `sk-language` header
    pub language: String,

    /// User agent string
    pub user_agent: String,

    /// Request timeout in seconds
    pub request_timeout_secs: u64,

    /// Upper bound on outbound requests per second (0 disables the limiter)
    pub requests_per_second: u32,
}

/// Minimum intervals between units of work
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PacingConfig {
    /// Minimum interval between role claims, in milliseconds
    pub role_delay_ms: u64,

    /// Minimum interval between accounts, in milliseconds
    pub account_delay_ms: u64,
}

/// Notification configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifyConfig {
    /// Discord webhook URL
    pub discord_webhook: Option<String>,

    /// Discord user id to mention
    pub discord_user: Option<String>,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (text, json)
    pub format: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            api_base_url: String::from(DEFAULT_API_BASE_URL),
            account_base_url: String::from(DEFAULT_ACCOUNT_BASE_URL),
            platform: String::from("3"),
            version_name: String::from("1.0.0"),
            language: String::from("en"),
            user_agent: String::from(SKPORT_USER_AGENT),
            request_timeout_secs: 30,
            requests_per_second: 5,
        }
    }
}

impl ApiConfig {
    /// Point both services at one base URL (mock servers)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        self.api_base_url = base_url.clone();
        self.account_base_url = base_url;
        self
    }

    /// Get request timeout as Duration
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Client identity for headers and signatures
    pub fn profile(&self) -> ClientProfile {
        ClientProfile {
            platform: self.platform.clone(),
            version_name: self.version_name.clone(),
            language: self.language.clone(),
            user_agent: self.user_agent.clone(),
        }
    }
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            role_delay_ms: 500,
            account_delay_ms: 1000,
        }
    }
}

impl PacingConfig {
    /// No waiting at all (tests, single-role runs)
    pub fn none() -> Self {
        Self {
            role_delay_ms: 0,
            account_delay_ms: 0,
        }
    }

    pub fn role_interval(&self) -> Duration {
        Duration::from_millis(self.role_delay_ms)
    }

    pub fn account_interval(&self) -> Duration {
        Duration::from_millis(self.account_delay_ms)
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: String::from("info"),
            format: String::from("text"),
        }
    }
}

/// Split a multi-line variable into trimmed, non-empty lines
pub fn split_lines(value: &str) -> Vec<String> {
    value
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect()
}

/// Parse `cred:secret` lines into credential sources
pub fn parse_credential_lines(value: &str) -> Result<Vec<AccountSource>> {
    split_lines(value)
        .into_iter()
        .enumerate()
        .map(|(i, line)| {
            let (cred, secret) = line.split_once(':').ok_or_else(|| {
                Error::config(format!("ACCOUNT_CRED line {} is not in cred:secret form", i + 1))
            })?;
            Ok(AccountSource::Credential {
                cred: cred.trim().to_string(),
                secret: secret.trim().to_string(),
            })
        })
        .collect()
}

fn env_nonempty(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse::<T>().ok())
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` when no account is configured or a value is malformed
    pub fn from_env() -> Result<Self> {
        let mut accounts: Vec<AccountSource> = std::env::var("ACCOUNT_TOKEN")
            .map(|v| split_lines(&v))
            .unwrap_or_default()
            .into_iter()
            .map(|token| AccountSource::Token { token })
            .collect();

        if let Ok(creds) = std::env::var("ACCOUNT_CRED") {
            accounts.extend(parse_credential_lines(&creds)?);
        }

        let defaults = ApiConfig::default();
        let api = ApiConfig {
            api_base_url: env_nonempty("SKPORT_API_URL").unwrap_or(defaults.api_base_url),
            account_base_url: env_nonempty("SKPORT_ACCOUNT_URL")
                .unwrap_or(defaults.account_base_url),
            language: env_nonempty("SKPORT_LANGUAGE").unwrap_or(defaults.language),
            request_timeout_secs: env_parse("CHECKIN_REQUEST_TIMEOUT")
                .unwrap_or(defaults.request_timeout_secs),
            ..defaults
        };

        let pacing_defaults = PacingConfig::default();
        let pacing = PacingConfig {
            role_delay_ms: env_parse("CHECKIN_ROLE_DELAY_MS")
                .unwrap_or(pacing_defaults.role_delay_ms),
            account_delay_ms: env_parse("CHECKIN_ACCOUNT_DELAY_MS")
                .unwrap_or(pacing_defaults.account_delay_ms),
        };

        let notify = NotifyConfig {
            discord_webhook: env_nonempty("DISCORD_WEBHOOK"),
            discord_user: env_nonempty("DISCORD_USER"),
        };

        let logging = LoggingConfig {
            level: env_nonempty("CHECKIN_LOG_LEVEL").unwrap_or_else(|| String::from("info")),
            format: env_nonempty("CHECKIN_LOG_FORMAT").unwrap_or_else(|| String::from("text")),
        };

        let config = Self {
            accounts,
            api,
            pacing,
            notify,
            logging,
        };
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!("Failed to read config file {}: {e}", path.display()))
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| {
            Error::config(format!(
                "Failed to parse TOML config file {}: {e}",
                path.display()
            ))
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.accounts.is_empty() {
            return Err(Error::config(
                "ACCOUNT_TOKEN environment variable is required (one or more tokens separated by newlines)",
            ));
        }

        for (i, account) in self.accounts.iter().enumerate() {
            let empty = match account {
                AccountSource::Token { token } => token.trim().is_empty(),
                AccountSource::Credential { cred, .. } => cred.trim().is_empty(),
            };
            if empty {
                return Err(Error::config(format!("account {} is empty", i + 1)));
            }
        }

        for (name, value) in [
            ("api_base_url", &self.api.api_base_url),
            ("account_base_url", &self.api.account_base_url),
        ] {
            let parsed = url::Url::parse(value)
                .map_err(|e| Error::config(format!("{name} '{value}' is not a valid URL: {e}")))?;
            if !matches!(parsed.scheme(), "http" | "https") {
                return Err(Error::config(format!("{name} must use http or https")));
            }
        }

        if self.api.request_timeout_secs == 0 {
            return Err(Error::config("request_timeout_secs must be greater than 0"));
        }

        Ok(())
    }
}
