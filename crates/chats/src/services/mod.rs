//! Service layer consumed by the REST surface and the CLI.

pub mod conversation_service;

pub use conversation_service::ConversationService;
