//! Chat collaborator seam
//!
//! Everything the engine needs from the chat platform goes through the
//! `ChatClient` trait: message send/fetch/edit/delete for the leaderboard
//! artifact, member lookup for the moderator gate, and role grants for
//! milestone rewards. The live implementation is `discord::DiscordRestClient`;
//! tests substitute a mock.

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

/// Errors from the chat collaborator.
///
/// `NotFound` is load-bearing: the publisher matches on it to decide
/// between editing the live leaderboard message and recreating it.
/// Everything else is transient and handled by logging + retrying on the
/// next triggering event.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("chat api error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

impl ChatError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ChatError::NotFound(_))
    }
}

/// Outbound message payload (content and/or a single embed)
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MessagePayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub embeds: Vec<Embed>,
}

impl MessagePayload {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            embeds: Vec::new(),
        }
    }

    pub fn embed(embed: Embed) -> Self {
        Self {
            content: None,
            embeds: vec![embed],
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Embed {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<u32>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<EmbedField>,
    /// ISO 8601, rendered by the platform in the embed footer area
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

impl EmbedField {
    pub fn new(name: impl Into<String>, value: impl Into<String>, inline: bool) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            inline,
        }
    }
}

/// Handle to a message that exists (or existed) in a channel
#[derive(Debug, Clone)]
pub struct SentMessage {
    pub id: String,
    pub channel_id: String,
}

/// Guild member with resolved role names.
///
/// Role names (not ids) because both the moderator gate and the reward
/// grant are configured by name.
#[derive(Debug, Clone)]
pub struct Member {
    pub user_id: String,
    pub roles: Vec<String>,
}

impl Member {
    pub fn has_role(&self, role_name: &str) -> bool {
        self.roles.iter().any(|r| r == role_name)
    }
}

/// Abstract chat platform operations consumed by the engine
#[async_trait]
pub trait ChatClient: Send + Sync {
    async fn send_message(
        &self,
        channel_id: &str,
        payload: &MessagePayload,
    ) -> Result<SentMessage, ChatError>;

    async fn fetch_message(
        &self,
        channel_id: &str,
        message_id: &str,
    ) -> Result<SentMessage, ChatError>;

    async fn edit_message(
        &self,
        channel_id: &str,
        message_id: &str,
        payload: &MessagePayload,
    ) -> Result<(), ChatError>;

    /// Best-effort for the publisher: callers ignore failure when
    /// clearing a stale leaderboard message
    async fn delete_message(&self, channel_id: &str, message_id: &str) -> Result<(), ChatError>;

    async fn fetch_member(&self, guild_id: &str, user_id: &str) -> Result<Member, ChatError>;

    async fn grant_role(
        &self,
        guild_id: &str,
        user_id: &str,
        role_name: &str,
    ) -> Result<(), ChatError>;
}
