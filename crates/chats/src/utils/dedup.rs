use std::collections::{HashSet, VecDeque};

use crate::entities::Message;

/// Remembers recently seen message ids so redelivered messages can be
/// dropped on the consuming side.
///
/// Only the newest `capacity` ids are kept.
#[derive(Debug)]
pub struct MessageDeduplicator {
    seen: HashSet<String>,
    order: VecDeque<String>,
    capacity: usize,
}

impl MessageDeduplicator {
    pub fn new(capacity: usize) -> Self {
        Self {
            seen: HashSet::with_capacity(capacity),
            order: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
        }
    }

    /// True the first time a message id is seen.
    pub fn accept(&mut self, message: &Message) -> bool {
        if self.seen.contains(&message.message_id) {
            return false;
        }
        if self.order.len() == self.capacity {
            if let Some(evicted) = self.order.pop_front() {
                self.seen.remove(&evicted);
            }
        }
        self.seen.insert(message.message_id.clone());
        self.order.push_back(message.message_id.clone());
        true
    }

    /// Filter a history snapshot, keeping messages not seen before.
    pub fn accept_all(&mut self, messages: Vec<Message>) -> Vec<Message> {
        messages.into_iter().filter(|m| self.accept(m)).collect()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

impl Default for MessageDeduplicator {
    fn default() -> Self {
        Self::new(1024)
    }
}
