//! Event types exchanged with connected clients.

use serde::{Deserialize, Serialize};

use crate::entities::{Message, ParticipantKind};
use crate::types::ChatError;

/// Events a client sends over its channel.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum ClientEvent {
    /// Participant is online on this channel
    AnnouncePresence { participant_id: String },

    /// Open the conversation with `counterpart_id`
    JoinRoom {
        participant_id: String,
        #[serde(default)]
        participant_kind: Option<ParticipantKind>,
        counterpart_id: String,
    },

    /// Persist and deliver a message
    SendMessage {
        sender_id: String,
        sender_kind: ParticipantKind,
        recipient_id: String,
        body: String,
    },

    /// Typing indicator for the current room
    SetTyping { participant_id: String, is_typing: bool },

    /// Flag every message addressed to `reader_id` as read
    MarkRead { conversation_key: String, reader_id: String },

    /// Stop receiving broadcasts for a conversation
    LeaveRoom { conversation_key: String },
}

impl ClientEvent {
    /// Event name for logging
    pub fn event_type_name(&self) -> &'static str {
        match self {
            ClientEvent::AnnouncePresence { .. } => "announce-presence",
            ClientEvent::JoinRoom { .. } => "join-room",
            ClientEvent::SendMessage { .. } => "send-message",
            ClientEvent::SetTyping { .. } => "set-typing",
            ClientEvent::MarkRead { .. } => "mark-read",
            ClientEvent::LeaveRoom { .. } => "leave-room",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PresenceStatus {
    Online,
    Offline,
}

/// Events the engine pushes to client channels.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum ServerEvent {
    /// A participant came online or went offline
    StatusChanged {
        participant_id: String,
        status: PresenceStatus,
    },

    /// History snapshot sent to a channel that just joined
    LoadMessages {
        conversation_key: String,
        messages: Vec<Message>,
    },

    /// A message was persisted in a room this channel belongs to
    NewMessage { message: Message },

    /// A message arrived in a conversation the recipient has not joined
    Notification {
        conversation_key: String,
        body: String,
        sender_id: String,
        timestamp: i64,
    },

    /// Another room member is typing
    UserTyping { participant_id: String, is_typing: bool },

    /// The reader's unread messages were flipped to read
    MessagesRead {
        conversation_key: String,
        reader_id: String,
    },

    /// Failure of a request made on this channel
    Error { kind: String, message: String },
}

impl ServerEvent {
    /// Error event for the originating channel
    pub fn from_error(error: &ChatError) -> Self {
        ServerEvent::Error {
            kind: error.kind().to_string(),
            message: error.to_string(),
        }
    }

    /// Event name for logging
    pub fn event_type_name(&self) -> &'static str {
        match self {
            ServerEvent::StatusChanged { .. } => "status-changed",
            ServerEvent::LoadMessages { .. } => "load-messages",
            ServerEvent::NewMessage { .. } => "new-message",
            ServerEvent::Notification { .. } => "notification",
            ServerEvent::UserTyping { .. } => "user-typing",
            ServerEvent::MessagesRead { .. } => "messages-read",
            ServerEvent::Error { .. } => "error",
        }
    }
}
