//! Discord REST adapter
//!
//! Thin `ChatClient` implementation over the Discord REST API. No
//! business logic lives here; the engine only sees the trait. Guild
//! roles are cached per guild so the role-name based moderator gate and
//! reward grant don't refetch the role list on every message.

use {
    crate::chat::{ChatClient, ChatError, Member, MessagePayload, SentMessage},
    async_trait::async_trait,
    serde::Deserialize,
    std::{collections::HashMap, time::Duration},
    tokio::sync::RwLock,
};

const API_BASE: &str = "https://discord.com/api/v10";

pub struct DiscordRestClient {
    http: reqwest::Client,
    token: String,
    /// Guild id -> role list, filled lazily
    role_cache: RwLock<HashMap<String, Vec<RoleRecord>>>,
}

#[derive(Debug, Clone, Deserialize)]
struct RoleRecord {
    id: String,
    name: String,
}

#[derive(Debug, Deserialize)]
struct MessageRecord {
    id: String,
    channel_id: String,
}

#[derive(Debug, Deserialize)]
struct MemberRecord {
    roles: Vec<String>,
}

impl DiscordRestClient {
    pub fn new(token: String) -> Result<Self, ChatError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            http,
            token,
            role_cache: RwLock::new(HashMap::new()),
        })
    }

    fn auth_header(&self) -> String {
        format!("Bot {}", self.token)
    }

    /// Map a response to the error taxonomy: 404 is the matchable
    /// NotFound case, any other failure status is a transient Api error
    async fn check(
        response: reqwest::Response,
        what: &str,
    ) -> Result<reqwest::Response, ChatError> {
        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(ChatError::NotFound(what.to_string()));
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ChatError::Api {
                status: status.as_u16(),
                message,
            });
        }
        Ok(response)
    }

    async fn fetch_guild_roles(&self, guild_id: &str) -> Result<Vec<RoleRecord>, ChatError> {
        let url = format!("{API_BASE}/guilds/{guild_id}/roles");
        let response = self
            .http
            .get(&url)
            .header("Authorization", self.auth_header())
            .send()
            .await?;
        let roles: Vec<RoleRecord> = Self::check(response, "guild roles")
            .await?
            .json()
            .await?;

        self.role_cache
            .write()
            .await
            .insert(guild_id.to_string(), roles.clone());
        Ok(roles)
    }

    /// Cached guild role list, fetching on first use
    async fn guild_roles(&self, guild_id: &str) -> Result<Vec<RoleRecord>, ChatError> {
        if let Some(roles) = self.role_cache.read().await.get(guild_id) {
            return Ok(roles.clone());
        }
        self.fetch_guild_roles(guild_id).await
    }

    /// Resolve a role name to its id, refreshing the cache once if the
    /// name is unknown (covers roles created after startup)
    async fn resolve_role(&self, guild_id: &str, role_name: &str) -> Result<String, ChatError> {
        let roles = self.guild_roles(guild_id).await?;
        if let Some(role) = roles.iter().find(|r| r.name == role_name) {
            return Ok(role.id.clone());
        }

        let refreshed = self.fetch_guild_roles(guild_id).await?;
        refreshed
            .iter()
            .find(|r| r.name == role_name)
            .map(|r| r.id.clone())
            .ok_or_else(|| ChatError::NotFound(format!("role '{role_name}'")))
    }
}

#[async_trait]
impl ChatClient for DiscordRestClient {
    async fn send_message(
        &self,
        channel_id: &str,
        payload: &MessagePayload,
    ) -> Result<SentMessage, ChatError> {
        let url = format!("{API_BASE}/channels/{channel_id}/messages");
        let response = self
            .http
            .post(&url)
            .header("Authorization", self.auth_header())
            .json(payload)
            .send()
            .await?;
        let message: MessageRecord = Self::check(response, "channel").await?.json().await?;

        Ok(SentMessage {
            id: message.id,
            channel_id: message.channel_id,
        })
    }

    async fn fetch_message(
        &self,
        channel_id: &str,
        message_id: &str,
    ) -> Result<SentMessage, ChatError> {
        let url = format!("{API_BASE}/channels/{channel_id}/messages/{message_id}");
        let response = self
            .http
            .get(&url)
            .header("Authorization", self.auth_header())
            .send()
            .await?;
        let message: MessageRecord = Self::check(response, "message").await?.json().await?;

        Ok(SentMessage {
            id: message.id,
            channel_id: message.channel_id,
        })
    }

    async fn edit_message(
        &self,
        channel_id: &str,
        message_id: &str,
        payload: &MessagePayload,
    ) -> Result<(), ChatError> {
        let url = format!("{API_BASE}/channels/{channel_id}/messages/{message_id}");
        let response = self
            .http
            .patch(&url)
            .header("Authorization", self.auth_header())
            .json(payload)
            .send()
            .await?;
        Self::check(response, "message").await?;
        Ok(())
    }

    async fn delete_message(&self, channel_id: &str, message_id: &str) -> Result<(), ChatError> {
        let url = format!("{API_BASE}/channels/{channel_id}/messages/{message_id}");
        let response = self
            .http
            .delete(&url)
            .header("Authorization", self.auth_header())
            .send()
            .await?;
        Self::check(response, "message").await?;
        Ok(())
    }

    async fn fetch_member(&self, guild_id: &str, user_id: &str) -> Result<Member, ChatError> {
        let url = format!("{API_BASE}/guilds/{guild_id}/members/{user_id}");
        let response = self
            .http
            .get(&url)
            .header("Authorization", self.auth_header())
            .send()
            .await?;
        let member: MemberRecord = Self::check(response, "member").await?.json().await?;

        // The API reports role ids; the engine gates by name
        let roles = self.guild_roles(guild_id).await?;
        let role_names = member
            .roles
            .iter()
            .filter_map(|id| roles.iter().find(|r| &r.id == id))
            .map(|r| r.name.clone())
            .collect();

        Ok(Member {
            user_id: user_id.to_string(),
            roles: role_names,
        })
    }

    async fn grant_role(
        &self,
        guild_id: &str,
        user_id: &str,
        role_name: &str,
    ) -> Result<(), ChatError> {
        let role_id = self.resolve_role(guild_id, role_name).await?;
        let url = format!("{API_BASE}/guilds/{guild_id}/members/{user_id}/roles/{role_id}");
        let response = self
            .http
            .put(&url)
            .header("Authorization", self.auth_header())
            .header("Content-Length", "0")
            .send()
            .await?;
        Self::check(response, "member role").await?;
        Ok(())
    }
}
