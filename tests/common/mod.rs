//! Shared mock chat collaborator for integration tests

use async_trait::async_trait;
use modboard::chat::{ChatClient, ChatError, Member, MessagePayload, SentMessage};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;

/// In-memory chat platform: messages live in a map, moderators in a
/// set, role grants in a log. Tests can delete messages behind the
/// engine's back to exercise the publisher recovery path.
#[derive(Default)]
pub struct MockChatClient {
    next_id: AtomicU64,
    pub messages: Mutex<HashMap<String, MessagePayload>>,
    pub send_count: AtomicU64,
    pub edit_count: AtomicU64,
    pub delete_count: AtomicU64,
    pub moderators: Mutex<HashSet<String>>,
    pub granted_roles: Mutex<Vec<(String, String)>>,
    /// When set, fetch_message fails with a non-NotFound error
    pub fail_fetch: AtomicBool,
    /// When set, grant_role fails
    pub fail_grants: AtomicBool,
}

impl MockChatClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_moderator(&self, user_id: &str) {
        self.moderators.lock().unwrap().insert(user_id.to_string());
    }

    /// Simulate an external deletion of a message
    pub fn delete_behind_back(&self, message_id: &str) {
        self.messages.lock().unwrap().remove(message_id);
    }

    pub fn message_count(&self) -> usize {
        self.messages.lock().unwrap().len()
    }

    pub fn payload_of(&self, message_id: &str) -> Option<MessagePayload> {
        self.messages.lock().unwrap().get(message_id).cloned()
    }

    pub fn sends(&self) -> u64 {
        self.send_count.load(Ordering::SeqCst)
    }

    pub fn edits(&self) -> u64 {
        self.edit_count.load(Ordering::SeqCst)
    }

    pub fn deletes(&self) -> u64 {
        self.delete_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChatClient for MockChatClient {
    async fn send_message(
        &self,
        channel_id: &str,
        payload: &MessagePayload,
    ) -> Result<SentMessage, ChatError> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let id = format!("msg-{id}");
        self.messages
            .lock()
            .unwrap()
            .insert(id.clone(), payload.clone());
        self.send_count.fetch_add(1, Ordering::SeqCst);
        Ok(SentMessage {
            id,
            channel_id: channel_id.to_string(),
        })
    }

    async fn fetch_message(
        &self,
        channel_id: &str,
        message_id: &str,
    ) -> Result<SentMessage, ChatError> {
        if self.fail_fetch.load(Ordering::SeqCst) {
            return Err(ChatError::Api {
                status: 500,
                message: "injected failure".to_string(),
            });
        }
        if self.messages.lock().unwrap().contains_key(message_id) {
            Ok(SentMessage {
                id: message_id.to_string(),
                channel_id: channel_id.to_string(),
            })
        } else {
            Err(ChatError::NotFound(format!("message {message_id}")))
        }
    }

    async fn edit_message(
        &self,
        _channel_id: &str,
        message_id: &str,
        payload: &MessagePayload,
    ) -> Result<(), ChatError> {
        let mut messages = self.messages.lock().unwrap();
        match messages.get_mut(message_id) {
            Some(existing) => {
                *existing = payload.clone();
                self.edit_count.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
            None => Err(ChatError::NotFound(format!("message {message_id}"))),
        }
    }

    async fn delete_message(&self, _channel_id: &str, message_id: &str) -> Result<(), ChatError> {
        self.delete_count.fetch_add(1, Ordering::SeqCst);
        match self.messages.lock().unwrap().remove(message_id) {
            Some(_) => Ok(()),
            None => Err(ChatError::NotFound(format!("message {message_id}"))),
        }
    }

    async fn fetch_member(&self, _guild_id: &str, user_id: &str) -> Result<Member, ChatError> {
        let roles = if self.moderators.lock().unwrap().contains(user_id) {
            vec!["Moderators".to_string()]
        } else {
            vec![]
        };
        Ok(Member {
            user_id: user_id.to_string(),
            roles,
        })
    }

    async fn grant_role(
        &self,
        _guild_id: &str,
        user_id: &str,
        role_name: &str,
    ) -> Result<(), ChatError> {
        if self.fail_grants.load(Ordering::SeqCst) {
            return Err(ChatError::Api {
                status: 403,
                message: "missing permissions".to_string(),
            });
        }
        self.granted_roles
            .lock()
            .unwrap()
            .push((user_id.to_string(), role_name.to_string()));
        Ok(())
    }
}
