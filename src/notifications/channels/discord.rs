//! Discord webhook notification channel
//!
//! Sends the run transcript as a single `{"content": ...}` message.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::time::Duration;

use super::{Channel, ChannelError, ChannelResult, DeliveryStatus};
use crate::report::RunReport;

/// Only URLs with this prefix are delivered to
pub const DISCORD_WEBHOOK_PREFIX: &str = "https://discord.com/api/webhooks/";

/// Discord rejects message content longer than this
pub const DISCORD_CONTENT_LIMIT: usize = 2000;

const REPORT_TITLE: &str = "**Endfield Daily Check-in**";

/// Discord channel configuration
#[derive(Debug, Clone)]
pub struct DiscordConfig {
    /// Webhook URL endpoint
    pub url: String,
    /// Optional user id to mention at the top of the message
    pub mention_user: Option<String>,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

const DEFAULT_TIMEOUT_SECS: u64 = 10;

impl DiscordConfig {
    /// Create a new Discord configuration
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            mention_user: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Mention a user at the top of each message
    pub fn with_mention(mut self, user: impl Into<String>) -> Self {
        self.mention_user = Some(user.into());
        self
    }

    /// Whether the URL points at a Discord webhook
    pub fn is_discord_webhook(&self) -> bool {
        self.url
            .trim()
            .to_lowercase()
            .starts_with(DISCORD_WEBHOOK_PREFIX)
    }
}

/// Discord webhook channel
///
/// # Payload Format
///
/// ```json
/// { "content": "<@user>\n**Endfield Daily Check-in**\n(INFO) ...\n(ERROR) ..." }
/// ```
///
/// Only a `204 No Content` response counts as delivered.
pub struct DiscordChannel {
    config: DiscordConfig,
    client: Client,
    /// Skip the URL prefix check (mock servers)
    allow_any_url: bool,
}

impl DiscordChannel {
    /// Create a new Discord channel
    pub fn new(config: DiscordConfig) -> ChannelResult<Self> {
        if config.timeout_secs == 0 {
            return Err(ChannelError::InvalidConfig(
                "Timeout must be greater than 0".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ChannelError::Other(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            config,
            client,
            allow_any_url: false,
        })
    }

    /// Create a channel that delivers to any URL, for tests against mock servers
    pub fn unchecked(config: DiscordConfig) -> ChannelResult<Self> {
        let mut channel = Self::new(config)?;
        channel.allow_any_url = true;
        Ok(channel)
    }

    /// Build the message content from a report
    pub fn build_content(&self, report: &RunReport) -> String {
        let mut content = String::new();
        if let Some(user) = &self.config.mention_user {
            content.push_str(&format!("<@{user}>\n"));
        }
        content.push_str(REPORT_TITLE);
        content.push('\n');
        content.push_str(&report.render());

        truncate_chars(&content, DISCORD_CONTENT_LIMIT)
    }

    /// Build the webhook payload from a report
    pub fn build_payload(&self, report: &RunReport) -> serde_json::Value {
        serde_json::json!({ "content": self.build_content(report) })
    }
}

/// Truncate to at most `max` characters, marking the cut with an ellipsis
fn truncate_chars(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut truncated: String = text.chars().take(max.saturating_sub(1)).collect();
    truncated.push('…');
    truncated
}

#[async_trait]
impl Channel for DiscordChannel {
    fn name(&self) -> &str {
        "discord webhook"
    }

    fn validate(&self) -> Result<(), String> {
        if self.allow_any_url || self.config.is_discord_webhook() {
            Ok(())
        } else {
            Err("No valid DISCORD_WEBHOOK configured, skipping webhook send".to_string())
        }
    }

    async fn send(&self, report: &RunReport) -> ChannelResult<DeliveryStatus> {
        let payload = self.build_payload(report);

        let response = self
            .client
            .post(self.config.url.trim())
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::NO_CONTENT {
            tracing::info!("Webhook delivered (status: {status})");
            return Ok(DeliveryStatus::success_with_message(
                self.name(),
                "Successfully sent message to Discord webhook!",
            ));
        }

        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unable to read response body".to_string());
        tracing::warn!("Webhook rejected with HTTP {status}: {body}");

        Ok(DeliveryStatus::failure(
            self.name(),
            format!("Error sending message to Discord webhook (HTTP {status})"),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID_URL: &str = "https://discord.com/api/webhooks/123/abc";

    fn sample_report() -> RunReport {
        let mut report = RunReport::new();
        report.info("Account 1: Found 1 role(s)");
        report.error("  → Endmin (Lv.40) [Asia]: Claim failed: 10001");
        report
    }

    #[test]
    fn test_prefix_check() {
        assert!(DiscordConfig::new(VALID_URL).is_discord_webhook());
        assert!(DiscordConfig::new("  HTTPS://DISCORD.COM/api/webhooks/1/x ").is_discord_webhook());
        assert!(!DiscordConfig::new("https://example.com/hook").is_discord_webhook());

        let channel = DiscordChannel::new(DiscordConfig::new("https://example.com/hook")).unwrap();
        assert!(channel.validate().is_err());

        let channel = DiscordChannel::new(DiscordConfig::new(VALID_URL)).unwrap();
        assert!(channel.validate().is_ok());
    }

    #[test]
    fn test_unchecked_accepts_any_url() {
        let channel = DiscordChannel::unchecked(DiscordConfig::new("http://127.0.0.1:9")).unwrap();
        assert!(channel.validate().is_ok());
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let config = DiscordConfig {
            timeout_secs: 0,
            ..DiscordConfig::new(VALID_URL)
        };
        assert!(DiscordChannel::new(config).is_err());
    }

    #[test]
    fn test_content_layout() {
        let channel =
            DiscordChannel::new(DiscordConfig::new(VALID_URL).with_mention("4242")).unwrap();
        let content = channel.build_content(&sample_report());

        assert_eq!(
            content,
            "<@4242>\n**Endfield Daily Check-in**\n(INFO) Account 1: Found 1 role(s)\n(ERROR)   → Endmin (Lv.40) [Asia]: Claim failed: 10001"
        );
    }

    #[test]
    fn test_content_without_mention() {
        let channel = DiscordChannel::new(DiscordConfig::new(VALID_URL)).unwrap();
        let payload = channel.build_payload(&sample_report());
        let content = payload["content"].as_str().unwrap();
        assert!(content.starts_with("**Endfield Daily Check-in**\n"));
    }

    #[test]
    fn test_content_is_truncated_to_limit() {
        let mut report = RunReport::new();
        for i in 0..200 {
            report.info(format!("  → Role {i} (Lv.60) [Asia]: Already checked in today"));
        }
        let channel = DiscordChannel::new(DiscordConfig::new(VALID_URL)).unwrap();
        let content = channel.build_content(&report);

        assert_eq!(content.chars().count(), DISCORD_CONTENT_LIMIT);
        assert!(content.ends_with('…'));
    }
}
