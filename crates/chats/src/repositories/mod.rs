//! Ports to the external collaborators of the engine.
//!
//! The durable message store and the participant directory live outside the
//! engine. The SQLite implementations are in `taskdesk-database`; the
//! in-memory ones here back tests and local tooling.

pub mod memory;

use async_trait::async_trait;

use crate::entities::Message;
use crate::types::ChatResult;

pub use memory::{InMemoryDirectory, InMemoryMessageStore};

/// Append-only message store keyed by conversation key, then message id.
///
/// Every read returns messages ordered by timestamp ascending, ties broken
/// by insertion order.
#[async_trait]
pub trait MessageStore: Send + Sync + 'static {
    /// Persist a new message.
    async fn append(&self, message: &Message) -> ChatResult<()>;

    /// The newest `limit` messages of a conversation, oldest first.
    async fn latest(&self, conversation_key: &str, limit: usize) -> ChatResult<Vec<Message>>;

    /// Every message of a conversation, oldest first.
    async fn list(&self, conversation_key: &str) -> ChatResult<Vec<Message>>;

    /// Flip unread messages addressed to `reader_id` in one batch and return
    /// how many changed.
    async fn mark_read(&self, conversation_key: &str, reader_id: &str) -> ChatResult<u64>;

    /// The newest message of every conversation whose key contains
    /// `fragment` as a plain substring. Callers refine the match.
    async fn conversation_heads(&self, fragment: &str) -> ChatResult<Vec<Message>>;

    /// Remove a whole conversation and return how many messages went with it.
    async fn delete_conversation(&self, conversation_key: &str) -> ChatResult<u64>;
}

/// Read-only lookup into the portal's participant records.
#[async_trait]
pub trait ParticipantDirectory: Send + Sync + 'static {
    async fn display_name(&self, participant_id: &str) -> ChatResult<Option<String>>;

    /// Manager responsible for an employee.
    async fn manager_of(&self, employee_id: &str) -> ChatResult<Option<String>>;
}
