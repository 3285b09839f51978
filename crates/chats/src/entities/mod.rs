//! Domain entities of the conversation engine.

pub mod conversation;
pub mod message;

pub use conversation::ConversationSummary;
pub use message::{Message, ParticipantKind};
