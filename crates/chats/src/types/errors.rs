//! Error types for the conversation engine.

use thiserror::Error;

/// Result type alias for conversation operations
pub type ChatResult<T> = Result<T, ChatError>;

/// Main error type for the conversation engine
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ChatError {
    #[error("Invalid participant: {reason}")]
    InvalidParticipant { reason: String },

    #[error("Persistence failure: {message}")]
    PersistenceFailure { message: String },

    #[error("Unresolved conversation: {key}")]
    UnresolvedConversation { key: String },

    #[error("Not a member of conversation {key}")]
    NotAMember { key: String },
}

impl ChatError {
    /// Create an invalid participant error
    pub fn invalid_participant(reason: impl Into<String>) -> Self {
        Self::InvalidParticipant { reason: reason.into() }
    }

    /// Create a persistence failure error
    pub fn persistence(message: impl Into<String>) -> Self {
        Self::PersistenceFailure { message: message.into() }
    }

    /// Create an unresolved conversation error
    pub fn unresolved(key: impl Into<String>) -> Self {
        Self::UnresolvedConversation { key: key.into() }
    }

    /// Create a not-a-member error
    pub fn not_a_member(key: impl Into<String>) -> Self {
        Self::NotAMember { key: key.into() }
    }

    /// Stable name sent to clients in `error` events.
    pub fn kind(&self) -> &'static str {
        match self {
            ChatError::InvalidParticipant { .. } => "invalid_participant",
            ChatError::PersistenceFailure { .. } => "persistence_failure",
            ChatError::UnresolvedConversation { .. } => "unresolved_conversation",
            ChatError::NotAMember { .. } => "not_a_member",
        }
    }

    /// Errors that are logged and swallowed instead of reported to a client.
    pub fn is_benign(&self) -> bool {
        matches!(self, ChatError::NotAMember { .. })
    }
}

impl From<serde_json::Error> for ChatError {
    fn from(err: serde_json::Error) -> Self {
        Self::PersistenceFailure {
            message: format!("JSON serialization error: {}", err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_are_stable() {
        assert_eq!(ChatError::invalid_participant("x").kind(), "invalid_participant");
        assert_eq!(ChatError::persistence("x").kind(), "persistence_failure");
        assert_eq!(ChatError::unresolved("k").kind(), "unresolved_conversation");
        assert_eq!(ChatError::not_a_member("k").kind(), "not_a_member");
    }

    #[test]
    fn only_not_a_member_is_benign() {
        assert!(ChatError::not_a_member("k").is_benign());
        assert!(!ChatError::persistence("down").is_benign());
    }
}
