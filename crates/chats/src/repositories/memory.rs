use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{MessageStore, ParticipantDirectory};
use crate::entities::Message;
use crate::types::{ChatError, ChatResult};

/// Message store held in process memory.
#[derive(Default)]
pub struct InMemoryMessageStore {
    messages: RwLock<Vec<Message>>,
    failing: AtomicBool,
}

impl InMemoryMessageStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail with a persistence error.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn check(&self) -> ChatResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(ChatError::persistence("message store unavailable"));
        }
        Ok(())
    }

    fn ordered(messages: &[Message], conversation_key: &str) -> Vec<Message> {
        let mut found: Vec<Message> = messages
            .iter()
            .filter(|m| m.conversation_key == conversation_key)
            .cloned()
            .collect();
        // stable: equal timestamps keep insertion order
        found.sort_by_key(|m| m.timestamp);
        found
    }
}

#[async_trait]
impl MessageStore for InMemoryMessageStore {
    async fn append(&self, message: &Message) -> ChatResult<()> {
        self.check()?;
        let mut messages = self.messages.write().await;
        if messages.iter().any(|m| m.message_id == message.message_id) {
            return Err(ChatError::persistence(format!(
                "duplicate message id {}",
                message.message_id
            )));
        }
        messages.push(message.clone());
        Ok(())
    }

    async fn latest(&self, conversation_key: &str, limit: usize) -> ChatResult<Vec<Message>> {
        self.check()?;
        let messages = self.messages.read().await;
        let mut found = Self::ordered(&messages, conversation_key);
        let skip = found.len().saturating_sub(limit);
        Ok(found.split_off(skip))
    }

    async fn list(&self, conversation_key: &str) -> ChatResult<Vec<Message>> {
        self.check()?;
        let messages = self.messages.read().await;
        Ok(Self::ordered(&messages, conversation_key))
    }

    async fn mark_read(&self, conversation_key: &str, reader_id: &str) -> ChatResult<u64> {
        self.check()?;
        let mut messages = self.messages.write().await;
        let mut flipped = 0;
        for message in messages.iter_mut().filter(|m| {
            m.conversation_key == conversation_key && m.recipient_id == reader_id && !m.read
        }) {
            message.read = true;
            flipped += 1;
        }
        Ok(flipped)
    }

    async fn conversation_heads(&self, fragment: &str) -> ChatResult<Vec<Message>> {
        self.check()?;
        let messages = self.messages.read().await;
        let mut heads: HashMap<&str, &Message> = HashMap::new();
        for message in messages.iter().filter(|m| m.conversation_key.contains(fragment)) {
            let head = heads.entry(message.conversation_key.as_str()).or_insert(message);
            if message.timestamp >= head.timestamp {
                *head = message;
            }
        }
        Ok(heads.into_values().cloned().collect())
    }

    async fn delete_conversation(&self, conversation_key: &str) -> ChatResult<u64> {
        self.check()?;
        let mut messages = self.messages.write().await;
        let before = messages.len();
        messages.retain(|m| m.conversation_key != conversation_key);
        Ok((before - messages.len()) as u64)
    }
}

/// Participant directory backed by in-process maps.
#[derive(Default)]
pub struct InMemoryDirectory {
    names: RwLock<HashMap<String, String>>,
    managers: RwLock<HashMap<String, String>>,
    failing: AtomicBool,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, participant_id: impl Into<String>, name: impl Into<String>) {
        self.names.write().await.insert(participant_id.into(), name.into());
    }

    pub async fn assign_manager(&self, employee_id: impl Into<String>, manager_id: impl Into<String>) {
        self.managers.write().await.insert(employee_id.into(), manager_id.into());
    }

    /// Make every lookup fail.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn check(&self) -> ChatResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(ChatError::persistence("participant directory unavailable"));
        }
        Ok(())
    }
}

#[async_trait]
impl ParticipantDirectory for InMemoryDirectory {
    async fn display_name(&self, participant_id: &str) -> ChatResult<Option<String>> {
        self.check()?;
        Ok(self.names.read().await.get(participant_id).cloned())
    }

    async fn manager_of(&self, employee_id: &str) -> ChatResult<Option<String>> {
        self.check()?;
        Ok(self.managers.read().await.get(employee_id).cloned())
    }
}
