//! Delivery of run reports to external sinks
//!
//! ```text
//! ┌──────────────┐     ┌─────────────────┐
//! │  RunReport   │ ──▶ │ Channel (trait) │ ──▶ Discord webhook
//! └──────────────┘     └─────────────────┘
//! ```
//!
//! Delivery outcomes are written back into the report. A failed delivery is
//! recorded as an error entry but never decides the exit status of a run.

pub mod channels;

use crate::config::NotifyConfig;
use crate::error::Error;
use crate::report::RunReport;

pub use channels::discord::{DiscordChannel, DiscordConfig};
pub use channels::{Channel, ChannelError, DeliveryStatus};

/// Build the channels described by the notification config
pub fn channels_from_config(config: &NotifyConfig) -> Vec<Box<dyn Channel>> {
    let mut channels: Vec<Box<dyn Channel>> = Vec::new();

    if let Some(url) = &config.discord_webhook {
        let mut discord = DiscordConfig::new(url.clone());
        if let Some(user) = &config.discord_user {
            discord = discord.with_mention(user.clone());
        }
        match DiscordChannel::new(discord) {
            Ok(channel) => channels.push(Box::new(channel)),
            Err(e) => tracing::error!("Failed to create Discord channel: {e}"),
        }
    }

    channels
}

/// Send `report` through every channel, recording each outcome in it
pub async fn deliver(channels: &[Box<dyn Channel>], report: &mut RunReport) {
    for channel in channels {
        report.debug(format!("----- {} -----", channel.name().to_uppercase()));

        if let Err(reason) = channel.validate() {
            report.debug(reason);
            continue;
        }

        match channel.send(report).await {
            Ok(status) if status.success => report.info(status.message),
            Ok(status) => report.error(Error::Notification(status.message).to_string()),
            Err(e) => {
                report.error(Error::Notification(e.to_string()).to_string());
            }
        }
    }
}
