//! Volatile presence state.
//!
//! The registry is plain data owned by the coordinator task; it never
//! broadcasts by itself. Callers decide what to announce based on the
//! return values.

use std::collections::{HashMap, HashSet};

use crate::types::ChannelId;

/// A participant currently connected on one channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresenceEntry {
    pub participant_id: String,
    pub channel: ChannelId,
    pub joined_rooms: HashSet<String>,
}

/// Map of online participants to their channel and joined rooms.
#[derive(Debug, Default)]
pub struct PresenceRegistry {
    entries: HashMap<String, PresenceEntry>,
}

impl PresenceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `participant_id` as online on `channel` with no rooms.
    ///
    /// An existing entry is overwritten, not merged: the last announce wins.
    /// The replaced entry is returned.
    pub fn announce(&mut self, participant_id: &str, channel: ChannelId) -> Option<PresenceEntry> {
        self.announce_in_rooms(participant_id, channel, Vec::new())
    }

    /// Like [`announce`](Self::announce), seeding the room set with the rooms
    /// `channel` already belongs to.
    pub fn announce_in_rooms(
        &mut self,
        participant_id: &str,
        channel: ChannelId,
        rooms: impl IntoIterator<Item = String>,
    ) -> Option<PresenceEntry> {
        self.entries.insert(
            participant_id.to_string(),
            PresenceEntry {
                participant_id: participant_id.to_string(),
                channel,
                joined_rooms: rooms.into_iter().collect(),
            },
        )
    }

    /// Channel the participant is reachable on, if online.
    pub fn lookup(&self, participant_id: &str) -> Option<ChannelId> {
        self.entries.get(participant_id).map(|entry| entry.channel)
    }

    pub fn entry(&self, participant_id: &str) -> Option<&PresenceEntry> {
        self.entries.get(participant_id)
    }

    /// Participant announced on `channel`, if any.
    pub fn participant_on(&self, channel: ChannelId) -> Option<&str> {
        self.entries
            .values()
            .find(|entry| entry.channel == channel)
            .map(|entry| entry.participant_id.as_str())
    }

    /// Returns false when the participant is not online.
    pub fn record_room_join(&mut self, participant_id: &str, conversation_key: &str) -> bool {
        match self.entries.get_mut(participant_id) {
            Some(entry) => {
                entry.joined_rooms.insert(conversation_key.to_string());
                true
            }
            None => false,
        }
    }

    /// Returns false when nothing was recorded for that room.
    pub fn record_room_leave(&mut self, participant_id: &str, conversation_key: &str) -> bool {
        self.entries
            .get_mut(participant_id)
            .map(|entry| entry.joined_rooms.remove(conversation_key))
            .unwrap_or(false)
    }

    /// Drop the entry owned by `channel`.
    ///
    /// If the participant has since re-announced on another channel the
    /// entry belongs to that channel and is left alone.
    pub fn remove_by_channel(&mut self, channel: ChannelId) -> Option<PresenceEntry> {
        let participant_id = self
            .entries
            .iter()
            .find(|(_, entry)| entry.channel == channel)
            .map(|(id, _)| id.clone())?;
        self.entries.remove(&participant_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
