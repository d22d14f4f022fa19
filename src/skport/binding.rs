//! Role resolution via the player binding endpoint

use serde::{Deserialize, Deserializer};

use super::{message_or_raw, SkportClient};
use crate::error::{Error, Result};
use crate::models::{Role, SessionCredential, ENDFIELD_APP_CODE};

pub const BINDING_PATH: &str = "/api/v1/game/player/binding";

#[derive(Debug, Default, Deserialize)]
pub struct BindingData {
    #[serde(default, deserialize_with = "null_as_default")]
    pub list: Vec<AppBinding>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppBinding {
    #[serde(default, deserialize_with = "null_as_default")]
    pub app_code: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub binding_list: Vec<BindingEntry>,
}

#[derive(Debug, Default, Deserialize)]
pub struct BindingEntry {
    #[serde(default, deserialize_with = "null_as_default")]
    pub roles: Vec<RoleEntry>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleEntry {
    #[serde(default, deserialize_with = "string_or_number")]
    pub role_id: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub server_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub nickname: String,
    #[serde(default, deserialize_with = "lenient_level")]
    pub level: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub server_name: String,
}

// Fields may be sent as explicit `null`, which reads as empty.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

// Ids come back as strings or numbers depending on the region.
pub(crate) fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::String(s) => s,
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    })
}

fn lenient_level<'de, D>(deserializer: D) -> std::result::Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Number(n) => n.as_i64().unwrap_or_default(),
        serde_json::Value::String(s) => s.trim().parse().unwrap_or_default(),
        _ => 0,
    })
}

/// Flatten the Endfield roles of a binding response, preserving order
///
/// # Errors
///
/// `Error::NoBinding` when no Endfield entry exists or it has no bindings,
/// `Error::NoRoles` when the bindings hold no roles at all.
pub fn flatten_roles(data: BindingData) -> Result<Vec<Role>> {
    let app = data
        .list
        .into_iter()
        .find(|app| app.app_code == ENDFIELD_APP_CODE)
        .filter(|app| !app.binding_list.is_empty())
        .ok_or(Error::NoBinding)?;

    let roles: Vec<Role> = app
        .binding_list
        .into_iter()
        .flat_map(|binding| binding.roles)
        .map(|r| Role::new(r.role_id, r.server_id, r.nickname, r.level, r.server_name))
        .collect();

    if roles.is_empty() {
        return Err(Error::NoRoles);
    }

    Ok(roles)
}

/// Lists the playable roles bound to a session
pub struct RoleResolver<'a> {
    client: &'a SkportClient,
}

impl<'a> RoleResolver<'a> {
    pub fn new(client: &'a SkportClient) -> Self {
        Self { client }
    }

    /// Fetch and flatten every Endfield role of the account
    pub async fn list_roles(&self, session: &SessionCredential) -> Result<Vec<Role>> {
        let reply = self
            .client
            .signed_get::<BindingData>(session, BINDING_PATH, None)
            .await?;

        if reply.body.code != 0 {
            let fallback = format!("Binding API error: {}", reply.body.code);
            return Err(Error::Upstream {
                code: reply.body.code,
                message: message_or_raw(reply.body.message.as_deref(), &fallback),
            });
        }

        let roles = flatten_roles(reply.body.data.unwrap_or_default())?;
        tracing::debug!(count = roles.len(), "Resolved roles");
        Ok(roles)
    }
}
