use serde::{Deserialize, Serialize};

use super::Message;

/// One row of a participant's conversation list. Derived on demand, never stored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ConversationSummary {
    pub key: String,
    pub counterpart_id: String,
    pub counterpart_display_name: String,
    pub last_message: Message,
}
