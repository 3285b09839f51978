//! # TaskDesk Chats Crate
//!
//! The real-time conversation engine behind the TaskDesk portal. Managers
//! and employees hold two-party conversations; this crate derives their
//! canonical identity, tracks who is online, routes messages to the right
//! channels and rebuilds each participant's conversation list from the
//! message store.
//!
//! ## Architecture
//!
//! - **Identity**: canonical conversation keys
//! - **Coordinator**: the single task owning presence and rooms
//! - **Indexer / Services**: conversation listings and maintenance
//! - **Repositories**: ports to the message store and participant directory
//! - **Types**: errors and the client/server event vocabulary
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use taskdesk_chats::{Coordinator, CoordinatorConfig, InMemoryMessageStore};
//!
//! # async fn run() {
//! let store = Arc::new(InMemoryMessageStore::new());
//! let handle = Coordinator::spawn(store, CoordinatorConfig::default());
//! let (outbound, _events) = tokio::sync::mpsc::channel(100);
//! let channel = handle.connect(outbound);
//! # let _ = channel;
//! # }
//! ```

pub mod coordinator;
pub mod entities;
pub mod identity;
pub mod indexer;
pub mod presence;
pub mod repositories;
pub mod rooms;
pub mod services;
pub mod types;
pub mod utils;

// Re-export main types for convenience
pub use coordinator::{Coordinator, CoordinatorConfig, CoordinatorHandle, DEFAULT_HISTORY_LIMIT};
pub use entities::{ConversationSummary, Message, ParticipantKind};
pub use identity::ConversationKey;
pub use indexer::ConversationIndexer;
pub use presence::{PresenceEntry, PresenceRegistry};
pub use repositories::{
    InMemoryDirectory, InMemoryMessageStore, MessageStore, ParticipantDirectory,
};
pub use rooms::RoomTable;
pub use services::ConversationService;
pub use types::{ChannelId, ChatError, ChatResult, ClientEvent, PresenceStatus, ServerEvent};
pub use utils::{sanitize_body, MessageDeduplicator};
