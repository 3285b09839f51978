//! Room membership and message delivery.

use std::sync::Arc;

use tracing::{debug, info};

use super::{Command, Coordinator};
use crate::entities::{Message, ParticipantKind};
use crate::identity::{normalize_participant, ConversationKey};
use crate::repositories::MessageStore;
use crate::types::{ChannelId, ChatError, ChatResult, ServerEvent};
use crate::utils::sanitize_body;

impl<S: MessageStore> Coordinator<S> {
    pub(super) fn handle_join(
        &mut self,
        channel: ChannelId,
        participant_id: &str,
        participant_kind: Option<ParticipantKind>,
        counterpart_id: &str,
    ) -> ChatResult<()> {
        let participant_id = normalize_participant(participant_id)?;
        let key = ConversationKey::derive(&participant_id, counterpart_id)?;
        let conversation_key = key.to_string();

        self.rooms.join(channel, &conversation_key);
        // Only the channel that owns the presence entry updates its rooms.
        if self.presence.participant_on(channel) == Some(participant_id.as_str()) {
            self.presence.record_room_join(&participant_id, &conversation_key);
        } else {
            debug!(
                participant_id = %participant_id,
                %channel,
                "joined a room without announcing presence on this channel"
            );
        }

        info!(
            participant_id = %participant_id,
            kind = participant_kind.map(|k| k.as_str()),
            conversation_key = %conversation_key,
            %channel,
            "joined conversation"
        );

        let Some(continuations) = self.continuation_sender() else {
            return Ok(());
        };
        let store = Arc::clone(&self.store);
        let limit = self.config.history_limit;
        tokio::spawn(async move {
            let result = store.latest(&conversation_key, limit).await;
            let _ = continuations.send(Command::HistoryLoaded {
                channel,
                conversation_key,
                result,
            });
        });
        Ok(())
    }

    /// History arrived; only the joining channel gets the snapshot.
    pub(super) fn finish_join(
        &mut self,
        channel: ChannelId,
        conversation_key: String,
        result: ChatResult<Vec<Message>>,
    ) {
        match result {
            Ok(messages) => {
                debug!(
                    conversation_key = %conversation_key,
                    %channel,
                    count = messages.len(),
                    "delivering history"
                );
                self.deliver(
                    channel,
                    ServerEvent::LoadMessages {
                        conversation_key,
                        messages,
                    },
                );
            }
            Err(error) => self.report(channel, &error),
        }
    }

    pub(super) fn handle_send(
        &mut self,
        channel: ChannelId,
        sender_id: &str,
        sender_kind: ParticipantKind,
        recipient_id: &str,
        body: &str,
    ) -> ChatResult<()> {
        let sender_id = normalize_participant(sender_id)?;
        let recipient_id = normalize_participant(recipient_id)?;
        let key = ConversationKey::derive(&sender_id, &recipient_id)?;

        let body = sanitize_body(body, self.config.max_message_length);
        if body.is_empty() {
            return Err(ChatError::invalid_participant("message body is empty"));
        }

        let message = Message::new(&key, sender_id, sender_kind, recipient_id, body);

        let Some(continuations) = self.continuation_sender() else {
            return Ok(());
        };
        let store = Arc::clone(&self.store);
        tokio::spawn(async move {
            let result = store.append(&message).await;
            let _ = continuations.send(Command::MessagePersisted {
                channel,
                message,
                result,
            });
        });
        Ok(())
    }

    /// Broadcast a message once it is durable.
    pub(super) fn finish_send(&mut self, channel: ChannelId, message: Message, result: ChatResult<()>) {
        if let Err(error) = result {
            self.report(channel, &error);
            return;
        }

        let members = self.rooms.members(&message.conversation_key);
        info!(
            conversation_key = %message.conversation_key,
            message_id = %message.message_id,
            sender_id = %message.sender_id,
            recipients = members.len(),
            "message persisted"
        );

        // Online recipient looking at another room gets a notification instead.
        if let Some(recipient_channel) = self.presence.lookup(&message.recipient_id) {
            if !self.rooms.is_member(recipient_channel, &message.conversation_key) {
                self.deliver(
                    recipient_channel,
                    ServerEvent::Notification {
                        conversation_key: message.conversation_key.clone(),
                        body: message.body.clone(),
                        sender_id: message.sender_id.clone(),
                        timestamp: message.timestamp,
                    },
                );
            }
        }

        let event = ServerEvent::NewMessage { message };
        for member in members {
            self.deliver(member, event.clone());
        }
    }

    pub(super) fn handle_leave(&mut self, channel: ChannelId, conversation_key: &str) -> ChatResult<()> {
        if !self.rooms.leave(channel, conversation_key) {
            return Err(ChatError::not_a_member(conversation_key));
        }

        if let Some(participant_id) = self.presence.participant_on(channel).map(str::to_owned) {
            self.presence.record_room_leave(&participant_id, conversation_key);
        }

        debug!(conversation_key = %conversation_key, %channel, "left conversation");
        Ok(())
    }
}
