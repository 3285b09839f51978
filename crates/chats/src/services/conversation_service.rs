//! Conversation service for listing, opening and purging conversations

use std::sync::Arc;

use tracing::info;

use crate::entities::{ConversationSummary, Message, ParticipantKind};
use crate::identity::{classify, contains_segment, normalize_participant, ConversationKey};
use crate::indexer::{resolve_counterpart, ConversationIndexer};
use crate::repositories::{MessageStore, ParticipantDirectory};
use crate::types::{ChatError, ChatResult};
use crate::utils::{sanitize_body, DEFAULT_MAX_MESSAGE_LENGTH};

/// Greeting used when a conversation is opened without one.
pub const DEFAULT_GREETING: &str = "Hi!";

/// Conversation service
pub struct ConversationService<S, D> {
    store: Arc<S>,
    directory: Arc<D>,
    indexer: ConversationIndexer<S, D>,
    max_message_length: usize,
}

impl<S: MessageStore, D: ParticipantDirectory> ConversationService<S, D> {
    /// Create a new conversation service
    pub fn new(store: Arc<S>, directory: Arc<D>) -> Self {
        Self {
            indexer: ConversationIndexer::new(Arc::clone(&store), Arc::clone(&directory)),
            store,
            directory,
            max_message_length: DEFAULT_MAX_MESSAGE_LENGTH,
        }
    }

    /// Override the body length cap applied to opening messages
    pub fn with_max_message_length(mut self, max_message_length: usize) -> Self {
        self.max_message_length = max_message_length;
        self
    }

    /// Conversation list of a participant, newest first
    pub async fn list_conversations(&self, participant_id: &str) -> ChatResult<Vec<ConversationSummary>> {
        self.indexer.list_conversations(participant_id).await
    }

    /// Full history of a conversation, oldest first
    pub async fn list_messages(&self, conversation_key: &str) -> ChatResult<Vec<Message>> {
        let conversation_key = conversation_key.trim();
        if conversation_key.is_empty() {
            return Err(ChatError::invalid_participant("conversation key is empty"));
        }
        self.store.list(conversation_key).await
    }

    /// Seed a manager/employee conversation with an opening message from the
    /// manager, so it shows up in both conversation lists.
    pub async fn open_conversation(
        &self,
        manager_id: &str,
        employee_id: &str,
        greeting: Option<&str>,
    ) -> ChatResult<Message> {
        let manager_id = normalize_participant(manager_id)?;
        let employee_id = normalize_participant(employee_id)?;
        if classify(&manager_id) != Some(ParticipantKind::Manager) {
            return Err(ChatError::invalid_participant(format!(
                "{manager_id} is not a manager id"
            )));
        }

        let key = ConversationKey::derive(&manager_id, &employee_id)?;
        let body = sanitize_body(greeting.unwrap_or(DEFAULT_GREETING), self.max_message_length);
        if body.is_empty() {
            return Err(ChatError::invalid_participant("message body is empty"));
        }

        let message = Message::new(&key, manager_id, ParticipantKind::Manager, employee_id, body);
        self.store.append(&message).await?;

        info!(conversation_key = %key, message_id = %message.message_id, "conversation opened");
        Ok(message)
    }

    /// Open the conversation between an employee and their manager.
    pub async fn welcome_employee(&self, employee_id: &str, greeting: Option<&str>) -> ChatResult<Message> {
        let employee_id = normalize_participant(employee_id)?;
        let manager_id = self
            .directory
            .manager_of(&employee_id)
            .await?
            .ok_or_else(|| {
                ChatError::invalid_participant(format!("{employee_id} has no manager on record"))
            })?;
        self.open_conversation(&manager_id, &employee_id, greeting).await
    }

    /// Delete every conversation the participant takes part in.
    /// Returns the number of messages removed.
    ///
    /// A conversation only counts when the participant resolves to one of
    /// its two parties; an id that is a segment-bounded prefix of another id
    /// never matches.
    pub async fn purge_participant(&self, participant_id: &str) -> ChatResult<u64> {
        let participant_id = normalize_participant(participant_id)?;
        let heads = self.store.conversation_heads(&participant_id).await?;

        let mut removed = 0;
        let mut conversations = 0;
        for head in heads
            .iter()
            .filter(|head| contains_segment(&head.conversation_key, &participant_id))
            .filter(|head| resolve_counterpart(head, &participant_id).is_ok())
        {
            removed += self.store.delete_conversation(&head.conversation_key).await?;
            conversations += 1;
        }

        info!(participant_id = %participant_id, conversations, removed, "participant purged");
        Ok(removed)
    }
}
