use tracing::debug;

use super::Coordinator;
use crate::identity::normalize_participant;
use crate::repositories::MessageStore;
use crate::types::{ChannelId, ChatResult, ServerEvent};

impl<S: MessageStore> Coordinator<S> {
    /// Fan a typing indicator out to the other members of the channel's
    /// current room. Nothing is stored.
    pub(super) fn handle_typing(
        &mut self,
        channel: ChannelId,
        participant_id: &str,
        is_typing: bool,
    ) -> ChatResult<()> {
        let participant_id = normalize_participant(participant_id)?;

        let Some(conversation_key) = self.rooms.current_room(channel).map(str::to_owned) else {
            debug!(participant_id = %participant_id, %channel, "typing outside any room");
            return Ok(());
        };

        self.broadcast_room(
            &conversation_key,
            ServerEvent::UserTyping {
                participant_id,
                is_typing,
            },
            Some(channel),
        );
        Ok(())
    }
}
