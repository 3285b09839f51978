//! Per-participant conversation listing.
//!
//! Stored keys are joined strings, and employee ids contain the separator,
//! so a key cannot be split naively. The counterpart comes from the
//! structured sender/recipient of the newest message, checked by deriving
//! the key again. Splitting the key string is only a fallback, and it must
//! yield exactly one verified candidate.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::entities::{ConversationSummary, Message, ParticipantKind};
use crate::identity::{classify, contains_segment, normalize_participant, ConversationKey};
use crate::repositories::{MessageStore, ParticipantDirectory};
use crate::types::{ChatError, ChatResult};

pub struct ConversationIndexer<S, D> {
    store: Arc<S>,
    directory: Arc<D>,
}

impl<S: MessageStore, D: ParticipantDirectory> ConversationIndexer<S, D> {
    pub fn new(store: Arc<S>, directory: Arc<D>) -> Self {
        Self { store, directory }
    }

    /// Every conversation `participant_id` takes part in, newest activity
    /// first. Conversations whose counterpart cannot be determined are
    /// logged and left out.
    pub async fn list_conversations(&self, participant_id: &str) -> ChatResult<Vec<ConversationSummary>> {
        let participant_id = normalize_participant(participant_id)?;
        let heads = self.store.conversation_heads(&participant_id).await?;

        let mut summaries = Vec::with_capacity(heads.len());
        for head in heads {
            if !contains_segment(&head.conversation_key, &participant_id) {
                continue;
            }

            let counterpart_id = match resolve_counterpart(&head, &participant_id) {
                Ok(counterpart_id) => counterpart_id,
                Err(error) => {
                    warn!(
                        participant_id = %participant_id,
                        conversation_key = %head.conversation_key,
                        %error,
                        "dropping conversation from listing"
                    );
                    continue;
                }
            };

            let counterpart_display_name = self.display_name(&participant_id, &counterpart_id).await;
            summaries.push(ConversationSummary {
                key: head.conversation_key.clone(),
                counterpart_id,
                counterpart_display_name,
                last_message: head,
            });
        }

        summaries.sort_by(|a, b| b.last_message.timestamp.cmp(&a.last_message.timestamp));
        debug!(participant_id = %participant_id, count = summaries.len(), "listed conversations");
        Ok(summaries)
    }

    async fn display_name(&self, participant_id: &str, counterpart_id: &str) -> String {
        match self.directory.display_name(counterpart_id).await {
            Ok(Some(name)) if !name.trim().is_empty() => return name,
            Ok(_) => {}
            Err(error) => warn!(
                counterpart_id = %counterpart_id,
                %error,
                "directory lookup failed, using fallback label"
            ),
        }
        fallback_kind(participant_id, counterpart_id)
            .fallback_label()
            .to_string()
    }
}

/// The other party of the conversation `head` belongs to.
pub fn resolve_counterpart(head: &Message, participant_id: &str) -> ChatResult<String> {
    let sender = normalize_participant(&head.sender_id).ok();
    let recipient = normalize_participant(&head.recipient_id).ok();

    let structured = if sender.as_deref() == Some(participant_id) {
        recipient
    } else if recipient.as_deref() == Some(participant_id) {
        sender
    } else {
        None
    };

    if let Some(candidate) = structured {
        let verified = ConversationKey::derive(participant_id, &candidate)
            .is_ok_and(|key| key.as_str() == head.conversation_key);
        if verified {
            return Ok(candidate);
        }
    }

    let key = ConversationKey::resolve_legacy(&head.conversation_key, participant_id)?;
    key.counterpart_of(participant_id)
        .map(str::to_owned)
        .ok_or_else(|| ChatError::unresolved(&head.conversation_key))
}

fn fallback_kind(participant_id: &str, counterpart_id: &str) -> ParticipantKind {
    classify(counterpart_id).unwrap_or(match classify(participant_id) {
        Some(ParticipantKind::Employee) => ParticipantKind::Manager,
        _ => ParticipantKind::Employee,
    })
}
