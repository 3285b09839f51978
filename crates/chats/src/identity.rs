//! Canonical conversation identity.
//!
//! A conversation between two participants is identified by a
//! [`ConversationKey`]: both ids are normalized, sorted and joined with
//! [`KEY_SEPARATOR`]. The key keeps the two ids as structured parts so the
//! counterpart of a participant never has to be recovered from the joined
//! string. Splitting a joined key is reserved for stored rows whose sender
//! and recipient fields do not identify the parties, and accepts a split
//! only when it re-derives the exact same key.

use std::fmt;

use serde::{Serialize, Serializer};

use crate::entities::ParticipantKind;
use crate::types::{ChatError, ChatResult};

/// Character joining the two participant ids of a key.
pub const KEY_SEPARATOR: char = '_';

/// Mandatory leading character of manager ids.
pub const MANAGER_SIGIL: char = '+';

/// Prefix of system-generated employee ids.
pub const EMPLOYEE_PREFIX: &str = "emp_";

/// Normalize a raw participant id.
///
/// Manager ids (a digit run, with or without the sigil) always come back with
/// exactly one leading `+`. Everything else is only trimmed.
///
/// ```
/// use taskdesk_chats::identity::normalize_participant;
///
/// assert_eq!(normalize_participant(" 15551234567 ").unwrap(), "+15551234567");
/// assert_eq!(normalize_participant("+15551234567").unwrap(), "+15551234567");
/// assert_eq!(normalize_participant("emp_1_ab").unwrap(), "emp_1_ab");
/// assert!(normalize_participant("   ").is_err());
/// ```
pub fn normalize_participant(raw: &str) -> ChatResult<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ChatError::invalid_participant("participant id is empty"));
    }

    let digits = trimmed.strip_prefix(MANAGER_SIGIL).unwrap_or(trimmed);
    if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
        return Ok(format!("{MANAGER_SIGIL}{digits}"));
    }

    Ok(trimmed.to_string())
}

/// Infer the namespace of a participant id, if it matches one.
pub fn classify(id: &str) -> Option<ParticipantKind> {
    let id = id.trim();
    if id.starts_with(EMPLOYEE_PREFIX) {
        return Some(ParticipantKind::Employee);
    }

    let digits = id.strip_prefix(MANAGER_SIGIL).unwrap_or(id);
    if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
        Some(ParticipantKind::Manager)
    } else {
        None
    }
}

/// Whether `participant` occurs in `raw_key` as a whole run of separator
/// delimited segments, as opposed to a raw substring.
pub fn contains_segment(raw_key: &str, participant: &str) -> bool {
    if participant.is_empty() {
        return false;
    }

    raw_key.match_indices(participant).any(|(start, matched)| {
        let end = start + matched.len();
        let left_ok = start == 0 || raw_key[..start].ends_with(KEY_SEPARATOR);
        let right_ok = end == raw_key.len() || raw_key[end..].starts_with(KEY_SEPARATOR);
        left_ok && right_ok
    })
}

/// Canonical identity of a two-party conversation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConversationKey {
    low: String,
    high: String,
    rendered: String,
}

impl ConversationKey {
    /// Derive the key for two raw participant ids. Order does not matter.
    pub fn derive(a: &str, b: &str) -> ChatResult<Self> {
        let a = normalize_participant(a)?;
        let b = normalize_participant(b)?;

        if a == b {
            return Err(ChatError::invalid_participant(format!(
                "{a} cannot hold a conversation with itself"
            )));
        }

        let (low, high) = if a < b { (a, b) } else { (b, a) };
        let rendered = format!("{low}{KEY_SEPARATOR}{high}");
        Ok(Self { low, high, rendered })
    }

    /// Recover the key of `participant` from a joined key string written
    /// before parties were stored as structured fields. New code derives keys
    /// instead of parsing them.
    ///
    /// Every separator position is tried. A split qualifies when one side is
    /// exactly the participant and deriving a key from both sides reproduces
    /// `raw_key`. Anything other than a single qualifying counterpart is
    /// [`ChatError::UnresolvedConversation`].
    pub(crate) fn resolve_legacy(raw_key: &str, participant: &str) -> ChatResult<Self> {
        let participant = normalize_participant(participant)?;
        let mut found: Option<Self> = None;

        for (index, _) in raw_key.match_indices(KEY_SEPARATOR) {
            let left = &raw_key[..index];
            let right = &raw_key[index + KEY_SEPARATOR.len_utf8()..];

            let candidate = if left == participant {
                right
            } else if right == participant {
                left
            } else {
                continue;
            };

            let Ok(key) = Self::derive(&participant, candidate) else {
                continue;
            };
            if key.as_str() != raw_key {
                continue;
            }

            if let Some(existing) = &found {
                if existing != &key {
                    return Err(ChatError::unresolved(raw_key));
                }
                continue;
            }
            found = Some(key);
        }

        found.ok_or_else(|| ChatError::unresolved(raw_key))
    }

    /// The joined string form used for storage and on the wire.
    pub fn as_str(&self) -> &str {
        &self.rendered
    }

    /// Both participant ids in canonical order.
    pub fn participants(&self) -> (&str, &str) {
        (&self.low, &self.high)
    }

    /// Whether the (normalized) participant is one of the two parties.
    pub fn involves(&self, participant: &str) -> bool {
        normalize_participant(participant)
            .map(|p| p == self.low || p == self.high)
            .unwrap_or(false)
    }

    /// The other party of the conversation, if `participant` is one of them.
    pub fn counterpart_of(&self, participant: &str) -> Option<&str> {
        let participant = normalize_participant(participant).ok()?;
        if participant == self.low {
            Some(&self.high)
        } else if participant == self.high {
            Some(&self.low)
        } else {
            None
        }
    }
}

impl fmt::Display for ConversationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.rendered)
    }
}

impl AsRef<str> for ConversationKey {
    fn as_ref(&self) -> &str {
        &self.rendered
    }
}

impl Serialize for ConversationKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.rendered)
    }
}
