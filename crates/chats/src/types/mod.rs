//! Shared types for the conversation engine.
//!
//! Error definitions and the event vocabulary spoken over client channels.

pub mod errors;
pub mod events;

pub use errors::{ChatError, ChatResult};
pub use events::{ClientEvent, PresenceStatus, ServerEvent};

/// Identifies one live client connection.
pub type ChannelId = uuid::Uuid;
