//! Notification channels for delivering run reports

pub mod discord;

use async_trait::async_trait;
use std::fmt;

use crate::report::RunReport;

/// Result type for channel operations
pub type ChannelResult<T> = Result<T, ChannelError>;

/// Errors that can occur during channel operations
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Invalid channel configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Generic error
    #[error("Channel error: {0}")]
    Other(String),
}

/// Outcome of one delivery attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryStatus {
    /// Whether the notification was successfully delivered
    pub success: bool,
    /// Channel that delivered (or failed to deliver) the notification
    pub channel: String,
    /// Line recorded in the run report
    pub message: String,
}

impl DeliveryStatus {
    /// Create a successful delivery status with a message
    pub fn success_with_message(channel: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            success: true,
            channel: channel.into(),
            message: message.into(),
        }
    }

    /// Create a failed delivery status
    pub fn failure(channel: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            success: false,
            channel: channel.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = if self.success { "SUCCESS" } else { "FAILED" };
        write!(f, "[{status}] {}: {}", self.channel, self.message)
    }
}

/// Trait for notification channels
///
/// Implement this trait to deliver run reports somewhere new.
#[async_trait]
pub trait Channel: Send + Sync {
    /// Get the channel name
    fn name(&self) -> &str;

    /// Check whether the channel can deliver; `Err` carries the skip reason
    fn validate(&self) -> Result<(), String> {
        Ok(())
    }

    /// Send a run report through this channel
    async fn send(&self, report: &RunReport) -> ChannelResult<DeliveryStatus>;
}
