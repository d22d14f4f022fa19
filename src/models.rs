//! Core data structures for the check-in flow

use serde::{Deserialize, Serialize};
use std::fmt;

/// Fixed numeric identifier of Endfield on SKPort
pub const ENDFIELD_GAME_ID: &str = "3";

/// Application code of Endfield inside the binding list
pub const ENDFIELD_APP_CODE: &str = "endfield";

/// Short-lived session produced by the credential handshake
#[derive(Clone, PartialEq, Eq)]
pub struct SessionCredential {
    /// Identity sent as the `cred` header
    pub credential: String,
    /// HMAC key for request signatures, never sent over the wire
    pub secret: String,
    /// SKPort user id (empty when injected directly)
    pub user_id: String,
}

impl SessionCredential {
    pub fn new(
        credential: impl Into<String>,
        secret: impl Into<String>,
        user_id: impl Into<String>,
    ) -> Self {
        Self {
            credential: credential.into(),
            secret: secret.into(),
            user_id: user_id.into(),
        }
    }
}

impl fmt::Debug for SessionCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionCredential")
            .field("credential", &self.credential)
            .field("secret", &"<redacted>")
            .field("user_id", &self.user_id)
            .finish()
    }
}

/// A playable role bound to an account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    /// `{game_id}_{role_id}_{server_id}`, sent as `sk-game-role`
    pub composite_id: String,
    pub nickname: String,
    pub level: i64,
    pub server_name: String,
    pub server_id: String,
    pub role_id: String,
}

impl Role {
    /// Build a role, deriving its composite id
    pub fn new(
        role_id: impl Into<String>,
        server_id: impl Into<String>,
        nickname: impl Into<String>,
        level: i64,
        server_name: impl Into<String>,
    ) -> Self {
        let role_id = role_id.into();
        let server_id = server_id.into();
        Self {
            composite_id: composite_id(&role_id, &server_id),
            nickname: nickname.into(),
            level,
            server_name: server_name.into(),
            server_id,
            role_id,
        }
    }

    /// Human-readable label used in report lines
    pub fn label(&self) -> String {
        format!("{} (Lv.{}) [{}]", self.nickname, self.level, self.server_name)
    }
}

/// Derive the role-context header value
pub fn composite_id(role_id: &str, server_id: &str) -> String {
    format!("{ENDFIELD_GAME_ID}_{role_id}_{server_id}")
}

/// A single resolved attendance reward
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reward {
    pub name: String,
    pub count: i64,
}

impl fmt::Display for Reward {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} x{}", self.name, self.count)
    }
}

/// Result of the attendance check step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AttendanceStatus {
    /// Today's reward was already claimed
    pub has_today: bool,
    /// Number of sign-in records this cycle
    pub total_sign_ins: usize,
}

/// Outcome of processing one role
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClaimOutcome {
    AlreadyClaimed,
    ClaimedWithRewards(Vec<Reward>),
    ClaimedNoRewards,
    Failed(String),
}

impl ClaimOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    /// Report text for this outcome, without the role label
    pub fn describe(&self) -> String {
        match self {
            Self::AlreadyClaimed => "Already checked in today".to_string(),
            Self::ClaimedWithRewards(rewards) => {
                let rewards = rewards
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("Checked in! Rewards: {rewards}")
            }
            Self::ClaimedNoRewards => "Successfully checked in!".to_string(),
            Self::Failed(reason) => reason.clone(),
        }
    }
}
