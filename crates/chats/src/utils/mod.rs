//! Helpers shared by the engine and its consumers.

pub mod dedup;
pub mod validation;

pub use dedup::MessageDeduplicator;
pub use validation::{sanitize_body, DEFAULT_MAX_MESSAGE_LENGTH};
