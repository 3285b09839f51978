//! Shared application state for the gateway

use std::sync::Arc;

use taskdesk_chats::{ConversationService, CoordinatorHandle};
use taskdesk_database::{SqliteMessageStore, SqliteParticipantDirectory};

/// Conversation service over the SQLite stores
pub type SqliteConversationService =
    ConversationService<SqliteMessageStore, SqliteParticipantDirectory>;

/// Shared application state
#[derive(Clone)]
pub struct GatewayState {
    /// Handle into the conversation coordinator task
    pub coordinator: CoordinatorHandle,
    /// Conversation listings and history
    pub conversations: Arc<SqliteConversationService>,
    /// Events buffered per socket before the coordinator drops new ones
    pub outbound_buffer: usize,
    /// Origin allowed by CORS, `*` for any
    pub allowed_origin: String,
}

impl GatewayState {
    pub fn new(coordinator: CoordinatorHandle, conversations: Arc<SqliteConversationService>) -> Self {
        Self {
            coordinator,
            conversations,
            outbound_buffer: 100,
            allowed_origin: "*".to_string(),
        }
    }

    pub fn with_outbound_buffer(mut self, outbound_buffer: usize) -> Self {
        self.outbound_buffer = outbound_buffer.max(1);
        self
    }

    pub fn with_allowed_origin(mut self, allowed_origin: impl Into<String>) -> Self {
        self.allowed_origin = allowed_origin.into();
        self
    }
}
