//! Read receipts.

use std::sync::Arc;

use tracing::{debug, info};

use super::{Command, Coordinator};
use crate::identity::normalize_participant;
use crate::repositories::MessageStore;
use crate::types::{ChannelId, ChatError, ChatResult, ServerEvent};

impl<S: MessageStore> Coordinator<S> {
    pub(super) fn handle_mark_read(
        &mut self,
        channel: ChannelId,
        conversation_key: &str,
        reader_id: &str,
    ) -> ChatResult<()> {
        let reader_id = normalize_participant(reader_id)?;
        let conversation_key = conversation_key.trim().to_string();
        if conversation_key.is_empty() {
            return Err(ChatError::invalid_participant("conversation key is empty"));
        }

        let Some(continuations) = self.continuation_sender() else {
            return Ok(());
        };
        let store = Arc::clone(&self.store);
        tokio::spawn(async move {
            let result = store.mark_read(&conversation_key, &reader_id).await;
            let _ = continuations.send(Command::ReadMarked {
                channel,
                conversation_key,
                reader_id,
                result,
            });
        });
        Ok(())
    }

    /// Broadcast the receipt only when something actually flipped.
    pub(super) fn finish_mark_read(
        &mut self,
        channel: ChannelId,
        conversation_key: String,
        reader_id: String,
        result: ChatResult<u64>,
    ) {
        match result {
            Ok(0) => debug!(
                conversation_key = %conversation_key,
                reader_id = %reader_id,
                "nothing to mark read"
            ),
            Ok(flipped) => {
                info!(
                    conversation_key = %conversation_key,
                    reader_id = %reader_id,
                    flipped,
                    "messages marked read"
                );
                let event = ServerEvent::MessagesRead {
                    conversation_key: conversation_key.clone(),
                    reader_id,
                };
                self.broadcast_room(&conversation_key, event, None);
            }
            Err(error) => self.report(channel, &error),
        }
    }
}
