//! The conversation coordinator.
//!
//! One tokio task owns the [`PresenceRegistry`] and the [`RoomTable`] and
//! processes [`Command`]s strictly in arrival order. Store calls never run on
//! that task: they are spawned, and their completion is posted back as a
//! continuation command so broadcasting happens on the coordinator again.
//!
//! Transports talk to the coordinator through a cloneable
//! [`CoordinatorHandle`]. Every connected channel registers an outbound
//! `mpsc::Sender<ServerEvent>` that the coordinator writes to without
//! awaiting.

mod dispatch;
mod receipts;
mod typing;

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::entities::Message;
use crate::identity::normalize_participant;
use crate::presence::{PresenceEntry, PresenceRegistry};
use crate::repositories::MessageStore;
use crate::rooms::RoomTable;
use crate::types::{ChannelId, ChatError, ChatResult, ClientEvent, PresenceStatus, ServerEvent};
use crate::utils::DEFAULT_MAX_MESSAGE_LENGTH;

/// Messages loaded into a room snapshot when nothing is configured.
pub const DEFAULT_HISTORY_LIMIT: usize = 50;

/// Tunables of the coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoordinatorConfig {
    /// Size of the history window delivered on join
    pub history_limit: usize,
    /// Body length cap applied when sanitising
    pub max_message_length: usize,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            history_limit: DEFAULT_HISTORY_LIMIT,
            max_message_length: DEFAULT_MAX_MESSAGE_LENGTH,
        }
    }
}

/// Work items processed by the coordinator task.
#[derive(Debug)]
pub(crate) enum Command {
    Connect {
        channel: ChannelId,
        outbound: mpsc::Sender<ServerEvent>,
    },
    Disconnect {
        channel: ChannelId,
    },
    Client {
        channel: ChannelId,
        event: ClientEvent,
    },
    Lookup {
        participant_id: String,
        reply: oneshot::Sender<Option<PresenceEntry>>,
    },
    HistoryLoaded {
        channel: ChannelId,
        conversation_key: String,
        result: ChatResult<Vec<Message>>,
    },
    MessagePersisted {
        channel: ChannelId,
        message: Message,
        result: ChatResult<()>,
    },
    ReadMarked {
        channel: ChannelId,
        conversation_key: String,
        reader_id: String,
        result: ChatResult<u64>,
    },
}

/// Cloneable entry point into the coordinator task.
#[derive(Debug, Clone)]
pub struct CoordinatorHandle {
    commands: mpsc::UnboundedSender<Command>,
}

impl CoordinatorHandle {
    /// Register a new channel and return its id.
    pub fn connect(&self, outbound: mpsc::Sender<ServerEvent>) -> ChannelId {
        let channel = Uuid::new_v4();
        self.submit(Command::Connect { channel, outbound });
        channel
    }

    /// The transport behind `channel` closed.
    pub fn disconnect(&self, channel: ChannelId) {
        self.submit(Command::Disconnect { channel });
    }

    /// Queue a client event received on `channel`.
    pub fn dispatch(&self, channel: ChannelId, event: ClientEvent) {
        self.submit(Command::Client { channel, event });
    }

    /// Channel the participant is online on, if any.
    pub async fn lookup(&self, participant_id: &str) -> Option<ChannelId> {
        self.presence(participant_id).await.map(|entry| entry.channel)
    }

    /// Snapshot of the participant's presence entry, if online.
    pub async fn presence(&self, participant_id: &str) -> Option<PresenceEntry> {
        let (reply, response) = oneshot::channel();
        self.submit(Command::Lookup {
            participant_id: participant_id.to_string(),
            reply,
        });
        response.await.ok().flatten()
    }

    pub fn is_closed(&self) -> bool {
        self.commands.is_closed()
    }

    fn submit(&self, command: Command) {
        if self.commands.send(command).is_err() {
            warn!("conversation coordinator has stopped, dropping command");
        }
    }
}

/// State owned by the coordinator task.
pub struct Coordinator<S: MessageStore> {
    store: Arc<S>,
    config: CoordinatorConfig,
    presence: PresenceRegistry,
    rooms: RoomTable,
    channels: HashMap<ChannelId, mpsc::Sender<ServerEvent>>,
    continuations: mpsc::WeakUnboundedSender<Command>,
}

impl<S: MessageStore> Coordinator<S> {
    /// Start the coordinator on the current tokio runtime.
    ///
    /// The task stops once every handle is dropped and no store call is in
    /// flight.
    pub fn spawn(store: Arc<S>, config: CoordinatorConfig) -> CoordinatorHandle {
        let (commands, inbox) = mpsc::unbounded_channel();
        let coordinator = Self {
            store,
            config,
            presence: PresenceRegistry::new(),
            rooms: RoomTable::new(),
            channels: HashMap::new(),
            continuations: commands.downgrade(),
        };
        tokio::spawn(coordinator.run(inbox));
        CoordinatorHandle { commands }
    }

    async fn run(mut self, mut inbox: mpsc::UnboundedReceiver<Command>) {
        info!(
            history_limit = self.config.history_limit,
            "conversation coordinator started"
        );
        while let Some(command) = inbox.recv().await {
            self.handle(command);
        }
        info!("conversation coordinator stopped");
    }

    fn handle(&mut self, command: Command) {
        match command {
            Command::Connect { channel, outbound } => {
                debug!(%channel, "channel connected");
                self.channels.insert(channel, outbound);
            }
            Command::Disconnect { channel } => self.handle_disconnect(channel),
            Command::Client { channel, event } => self.handle_client_event(channel, event),
            Command::Lookup {
                participant_id,
                reply,
            } => {
                let found = normalize_participant(&participant_id)
                    .ok()
                    .and_then(|id| self.presence.entry(&id).cloned());
                let _ = reply.send(found);
            }
            Command::HistoryLoaded {
                channel,
                conversation_key,
                result,
            } => self.finish_join(channel, conversation_key, result),
            Command::MessagePersisted {
                channel,
                message,
                result,
            } => self.finish_send(channel, message, result),
            Command::ReadMarked {
                channel,
                conversation_key,
                reader_id,
                result,
            } => self.finish_mark_read(channel, conversation_key, reader_id, result),
        }
    }

    fn handle_client_event(&mut self, channel: ChannelId, event: ClientEvent) {
        debug!(%channel, event = event.event_type_name(), "client event");

        let outcome = match event {
            ClientEvent::AnnouncePresence { participant_id } => {
                self.handle_announce(channel, &participant_id)
            }
            ClientEvent::JoinRoom {
                participant_id,
                participant_kind,
                counterpart_id,
            } => self.handle_join(channel, &participant_id, participant_kind, &counterpart_id),
            ClientEvent::SendMessage {
                sender_id,
                sender_kind,
                recipient_id,
                body,
            } => self.handle_send(channel, &sender_id, sender_kind, &recipient_id, &body),
            ClientEvent::SetTyping {
                participant_id,
                is_typing,
            } => self.handle_typing(channel, &participant_id, is_typing),
            ClientEvent::MarkRead {
                conversation_key,
                reader_id,
            } => self.handle_mark_read(channel, &conversation_key, &reader_id),
            ClientEvent::LeaveRoom { conversation_key } => {
                self.handle_leave(channel, &conversation_key)
            }
        };

        if let Err(error) = outcome {
            self.report(channel, &error);
        }
    }

    fn handle_announce(&mut self, channel: ChannelId, participant_id: &str) -> ChatResult<()> {
        let participant_id = normalize_participant(participant_id)?;

        // A channel speaks for one participant at a time.
        if self
            .presence
            .participant_on(channel)
            .is_some_and(|current| current != participant_id)
        {
            if let Some(previous) = self.presence.remove_by_channel(channel) {
                self.broadcast_all(ServerEvent::StatusChanged {
                    participant_id: previous.participant_id,
                    status: PresenceStatus::Offline,
                });
            }
        }

        let rooms = self.rooms.rooms_of(channel);
        if let Some(replaced) = self.presence.announce_in_rooms(&participant_id, channel, rooms) {
            if replaced.channel != channel {
                debug!(
                    participant_id = %participant_id,
                    %channel,
                    previous_channel = %replaced.channel,
                    "presence moved to a new channel"
                );
            }
        }

        info!(participant_id = %participant_id, %channel, "participant online");
        self.broadcast_all(ServerEvent::StatusChanged {
            participant_id,
            status: PresenceStatus::Online,
        });
        Ok(())
    }

    fn handle_disconnect(&mut self, channel: ChannelId) {
        self.channels.remove(&channel);
        let rooms = self.rooms.drop_channel(channel);

        match self.presence.remove_by_channel(channel) {
            Some(entry) => {
                info!(
                    participant_id = %entry.participant_id,
                    %channel,
                    rooms = rooms.len(),
                    "participant offline"
                );
                self.broadcast_all(ServerEvent::StatusChanged {
                    participant_id: entry.participant_id,
                    status: PresenceStatus::Offline,
                });
            }
            None => debug!(%channel, "channel closed without owning a presence entry"),
        }
    }

    /// Send an error to the originating channel, or log benign ones.
    fn report(&self, channel: ChannelId, error: &ChatError) {
        if error.is_benign() {
            debug!(%channel, %error, "ignoring request");
            return;
        }
        warn!(%channel, kind = error.kind(), %error, "request failed");
        self.deliver(channel, ServerEvent::from_error(error));
    }

    /// Best-effort write to one channel. Channels that are gone are skipped.
    fn deliver(&self, channel: ChannelId, event: ServerEvent) {
        let Some(outbound) = self.channels.get(&channel) else {
            return;
        };
        match outbound.try_send(event) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(event)) => warn!(
                %channel,
                event = event.event_type_name(),
                "outbound buffer full, dropping event"
            ),
            Err(mpsc::error::TrySendError::Closed(_)) => {
                debug!(%channel, "outbound channel already closed")
            }
        }
    }

    fn broadcast_all(&self, event: ServerEvent) {
        for channel in self.channels.keys() {
            self.deliver(*channel, event.clone());
        }
    }

    fn broadcast_room(&self, conversation_key: &str, event: ServerEvent, except: Option<ChannelId>) {
        for channel in self.rooms.members(conversation_key) {
            if Some(channel) != except {
                self.deliver(channel, event.clone());
            }
        }
    }

    /// Sender used by spawned store calls to post their continuation.
    /// `None` once every handle is gone and the task is winding down.
    fn continuation_sender(&self) -> Option<mpsc::UnboundedSender<Command>> {
        self.continuations.upgrade()
    }
}
