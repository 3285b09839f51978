//! SQLite implementations of the conversation engine's ports.

pub mod directory;
pub mod message_store;

pub use directory::SqliteParticipantDirectory;
pub use message_store::SqliteMessageStore;
