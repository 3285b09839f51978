//! Broadcast groups keyed by conversation key.

use std::collections::{HashMap, HashSet};

use crate::types::ChannelId;

/// Which channels are subscribed to which conversations, plus the room each
/// channel joined most recently.
#[derive(Debug, Default)]
pub struct RoomTable {
    rooms: HashMap<String, HashSet<ChannelId>>,
    current: HashMap<ChannelId, String>,
}

impl RoomTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `channel` to the room and make it the channel's current room.
    /// Returns false if it was already a member.
    pub fn join(&mut self, channel: ChannelId, conversation_key: &str) -> bool {
        self.current.insert(channel, conversation_key.to_string());
        self.rooms
            .entry(conversation_key.to_string())
            .or_default()
            .insert(channel)
    }

    /// Idempotent removal. Returns false if the channel was not a member.
    pub fn leave(&mut self, channel: ChannelId, conversation_key: &str) -> bool {
        let removed = match self.rooms.get_mut(conversation_key) {
            Some(members) => {
                let removed = members.remove(&channel);
                if members.is_empty() {
                    self.rooms.remove(conversation_key);
                }
                removed
            }
            None => false,
        };

        if self.current.get(&channel).map(String::as_str) == Some(conversation_key) {
            self.current.remove(&channel);
        }
        removed
    }

    /// Remove the channel from every room and return the rooms it was in.
    pub fn drop_channel(&mut self, channel: ChannelId) -> Vec<String> {
        self.current.remove(&channel);
        let mut left = Vec::new();
        self.rooms.retain(|key, members| {
            if members.remove(&channel) {
                left.push(key.clone());
            }
            !members.is_empty()
        });
        left
    }

    pub fn members(&self, conversation_key: &str) -> Vec<ChannelId> {
        self.rooms
            .get(conversation_key)
            .map(|members| members.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn is_member(&self, channel: ChannelId, conversation_key: &str) -> bool {
        self.rooms
            .get(conversation_key)
            .is_some_and(|members| members.contains(&channel))
    }

    /// Every room the channel is currently a member of.
    pub fn rooms_of(&self, channel: ChannelId) -> Vec<String> {
        self.rooms
            .iter()
            .filter(|(_, members)| members.contains(&channel))
            .map(|(key, _)| key.clone())
            .collect()
    }

    /// Most recently joined room the channel has not left.
    pub fn current_room(&self, channel: ChannelId) -> Option<&str> {
        self.current.get(&channel).map(String::as_str)
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }
}
