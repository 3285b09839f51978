use std::{fmt, str::FromStr};

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::identity::ConversationKey;
use crate::types::ChatError;

/// Which identifier namespace a participant belongs to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ParticipantKind {
    #[serde(alias = "owner")]
    Manager,
    Employee,
}

impl ParticipantKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParticipantKind::Manager => "manager",
            ParticipantKind::Employee => "employee",
        }
    }

    /// Label shown when the directory has no display name.
    pub fn fallback_label(&self) -> &'static str {
        match self {
            ParticipantKind::Manager => "Manager",
            ParticipantKind::Employee => "Employee",
        }
    }
}

impl fmt::Display for ParticipantKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ParticipantKind {
    type Err = ChatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "manager" | "owner" => Ok(ParticipantKind::Manager),
            "employee" => Ok(ParticipantKind::Employee),
            other => Err(ChatError::invalid_participant(format!(
                "unknown participant kind {other}"
            ))),
        }
    }
}

/// A persisted chat message.
///
/// Everything except `read` is immutable once stored, and `read` only ever
/// goes from `false` to `true`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Globally unique id, used by consumers to drop redeliveries
    pub message_id: String,
    /// Joined form of the conversation key
    pub conversation_key: String,
    pub sender_id: String,
    pub sender_kind: ParticipantKind,
    pub recipient_id: String,
    pub body: String,
    /// Server time in epoch milliseconds
    pub timestamp: i64,
    pub read: bool,
}

impl Message {
    /// Build a new unread message stamped with the current server time.
    pub fn new(
        key: &ConversationKey,
        sender_id: impl Into<String>,
        sender_kind: ParticipantKind,
        recipient_id: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            message_id: cuid2::create_id(),
            conversation_key: key.to_string(),
            sender_id: sender_id.into(),
            sender_kind,
            recipient_id: recipient_id.into(),
            body: body.into(),
            timestamp: Utc::now().timestamp_millis(),
            read: false,
        }
    }

    /// Override the timestamp, mostly for seeding and tests.
    pub fn with_timestamp(mut self, timestamp: i64) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Whether `participant` is the sender or the recipient.
    pub fn involves(&self, participant: &str) -> bool {
        self.sender_id == participant || self.recipient_id == participant
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_messages_are_unread_and_uniquely_identified() {
        let key = ConversationKey::derive("+15551234567", "emp_1_ab").unwrap();
        let first = Message::new(&key, "+15551234567", ParticipantKind::Manager, "emp_1_ab", "hi");
        let second = Message::new(&key, "+15551234567", ParticipantKind::Manager, "emp_1_ab", "hi");

        assert!(!first.read);
        assert_ne!(first.message_id, second.message_id);
        assert_eq!(first.conversation_key, "+15551234567_emp_1_ab");
    }

    #[test]
    fn owner_is_accepted_as_manager() {
        let kind: ParticipantKind = serde_json::from_str("\"owner\"").unwrap();
        assert_eq!(kind, ParticipantKind::Manager);
        assert_eq!("Employee".parse::<ParticipantKind>().unwrap(), ParticipantKind::Employee);
        assert!("intern".parse::<ParticipantKind>().is_err());
    }

    #[test]
    fn message_serializes_in_camel_case() {
        let key = ConversationKey::derive("+1", "emp_1_ab").unwrap();
        let message = Message::new(&key, "+1", ParticipantKind::Manager, "emp_1_ab", "hello")
            .with_timestamp(42);
        let value = serde_json::to_value(&message).unwrap();

        assert_eq!(value["conversationKey"], "+1_emp_1_ab");
        assert_eq!(value["senderKind"], "manager");
        assert_eq!(value["recipientId"], "emp_1_ab");
        assert_eq!(value["timestamp"], 42);
    }
}
