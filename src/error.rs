//! Unified error handling for the endfield-checkin crate
//!
//! Every fallible step of a run returns [`Error`]. The orchestrator catches
//! errors at the account and role boundaries and turns them into report
//! entries, so only configuration problems ever escape a run.
//!
//! # Usage
//!
//! ```rust,ignore
//! use endfield_checkin::error::{Error, ErrorCategory};
//!
//! fn handle_error(err: Error) {
//!     if err.category() == ErrorCategory::Config {
//!         eprintln!("Fix your configuration: {err}");
//!     }
//! }
//! ```

use thiserror::Error;

/// Classification of errors, used for log fields and exit handling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Credential exchange failures
    Auth,
    /// Role binding lookup failures
    Binding,
    /// Attendance check or claim failures
    Attendance,
    /// Configuration and validation errors
    Config,
    /// Webhook delivery failures
    Notification,
    /// Transport and decoding errors
    Network,
}

impl ErrorCategory {
    /// Get string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Auth => "auth",
            Self::Binding => "binding",
            Self::Attendance => "attendance",
            Self::Config => "config",
            Self::Notification => "notification",
            Self::Network => "network",
        }
    }
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unified error type for the crate
#[derive(Error, Debug)]
pub enum Error {
    /// A numbered step of the credential handshake failed
    #[error("OAuth Step {step} Failed: {message}")]
    Handshake { step: u8, message: String },

    /// The account has no Endfield binding
    #[error("No Endfield account binding found")]
    NoBinding,

    /// The Endfield binding exists but holds no roles
    #[error("No roles found in binding")]
    NoRoles,

    /// Attendance check or claim was rejected upstream
    #[error("{0}")]
    ClaimFailed(String),

    /// Upstream returned a non-zero code outside of the handshake or claim
    #[error("{message}")]
    Upstream { code: i64, message: String },

    /// A request signature could not be computed
    #[error("Signing error: {0}")]
    Signing(String),

    /// Configuration errors
    #[error("Config error: {0}")]
    Config(String),

    /// Webhook delivery errors
    #[error("Notification error: {0}")]
    Notification(String),

    /// HTTP client errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a handshake error for the given step
    pub fn handshake(step: u8, message: impl Into<String>) -> Self {
        Self::Handshake {
            step,
            message: message.into(),
        }
    }

    /// Get the error category
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Handshake { .. } | Self::Signing(_) => ErrorCategory::Auth,
            Self::NoBinding | Self::NoRoles | Self::Upstream { .. } => ErrorCategory::Binding,
            Self::ClaimFailed(_) => ErrorCategory::Attendance,
            Self::Config(_) => ErrorCategory::Config,
            Self::Notification(_) => ErrorCategory::Notification,
            Self::Http(_) | Self::Json(_) => ErrorCategory::Network,
        }
    }

    /// Handshake step that failed, if this is a handshake error
    pub fn handshake_step(&self) -> Option<u8> {
        match self {
            Self::Handshake { step, .. } => Some(*step),
            _ => None,
        }
    }
}

/// Result type alias using the unified Error type
pub type Result<T> = std::result::Result<T, Error>;
