//! Daily attendance check and claim
//!
//! Per role the claimer runs a two-state machine:
//!
//! ```text
//!   Check (GET) ──hasToday──▶ AlreadyClaimed
//!       │
//!       └──otherwise──▶ Claim (POST) ──▶ ClaimedWithRewards | ClaimedNoRewards
//! ```
//!
//! Check and claim are signed independently, each with its own timestamp.
//! A non-zero code from either call fails the role with `Error::ClaimFailed`.

use serde::Deserialize;
use std::collections::HashMap;

use super::binding::{null_as_default, string_or_number};
use super::{message_or_raw, SkportClient};
use crate::error::{Error, Result};
use crate::models::{AttendanceStatus, ClaimOutcome, Reward, Role, SessionCredential};

pub const ATTENDANCE_PATH: &str = "/web/v1/game/endfield/attendance";

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckData {
    #[serde(default, deserialize_with = "null_as_default")]
    pub has_today: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub records: Vec<serde_json::Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimData {
    #[serde(default, deserialize_with = "null_as_default")]
    pub award_ids: Vec<AwardId>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub resource_info_map: HashMap<String, ResourceInfo>,
}

#[derive(Debug, Deserialize)]
pub struct AwardId {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResourceInfo {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub count: i64,
}

/// Resolve award ids against the resource map; unknown ids are skipped
pub fn resolve_rewards(data: &ClaimData) -> Vec<Reward> {
    data.award_ids
        .iter()
        .filter_map(|award| data.resource_info_map.get(&award.id))
        .map(|info| Reward {
            name: info.name.clone(),
            count: info.count,
        })
        .collect()
}

/// Checks and claims the daily reward for roles of one session
pub struct AttendanceClaimer<'a> {
    client: &'a SkportClient,
}

impl<'a> AttendanceClaimer<'a> {
    pub fn new(client: &'a SkportClient) -> Self {
        Self { client }
    }

    /// Run the check/claim state machine for one role
    pub async fn claim_for_role(
        &self,
        session: &SessionCredential,
        role: &Role,
    ) -> Result<ClaimOutcome> {
        let status = self.check(session, role).await?;
        tracing::debug!(
            role = %role.composite_id,
            has_today = status.has_today,
            total_sign_ins = status.total_sign_ins,
            "Attendance status"
        );

        if status.has_today {
            return Ok(ClaimOutcome::AlreadyClaimed);
        }

        let rewards = self.claim(session, role).await?;
        if rewards.is_empty() {
            Ok(ClaimOutcome::ClaimedNoRewards)
        } else {
            Ok(ClaimOutcome::ClaimedWithRewards(rewards))
        }
    }

    /// Check state: has today's reward been claimed already?
    pub async fn check(&self, session: &SessionCredential, role: &Role) -> Result<AttendanceStatus> {
        let reply = self
            .client
            .signed_get::<CheckData>(session, ATTENDANCE_PATH, Some(&role.composite_id))
            .await
            .map_err(|e| Error::ClaimFailed(e.to_string()))?;

        if reply.body.code != 0 {
            let fallback = format!("Attendance status check failed: {}", reply.body.code);
            return Err(Error::ClaimFailed(message_or_raw(
                reply.body.message.as_deref(),
                &fallback,
            )));
        }

        let data = reply.body.data.unwrap_or_default();
        Ok(AttendanceStatus {
            has_today: data.has_today,
            total_sign_ins: data.records.len(),
        })
    }

    /// Claim state: POST with a fresh signature and collect the rewards
    pub async fn claim(&self, session: &SessionCredential, role: &Role) -> Result<Vec<Reward>> {
        let reply = self
            .client
            .signed_post::<ClaimData>(session, ATTENDANCE_PATH, Some(&role.composite_id))
            .await
            .map_err(|e| Error::ClaimFailed(e.to_string()))?;

        if reply.body.code != 0 {
            let fallback = format!("Claim failed: {}", reply.body.code);
            return Err(Error::ClaimFailed(message_or_raw(
                reply.body.message.as_deref(),
                &fallback,
            )));
        }

        Ok(resolve_rewards(&reply.body.data.unwrap_or_default()))
    }
}
