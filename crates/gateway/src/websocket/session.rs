//! One client session: a socket bridged to the conversation coordinator.
//!
//! The writer task drains the channel's outbound queue into the socket. The
//! reader loop parses client frames and hands them to the coordinator. When
//! either side finishes the other is aborted and the channel disconnected.

use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use taskdesk_chats::{ChannelId, ClientEvent, CoordinatorHandle, ServerEvent};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::state::GatewayState;

/// Error kind sent back for frames that are not a known client event
pub const INVALID_EVENT: &str = "invalid_event";

pub async fn conversation_websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<GatewayState>>,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: Arc<GatewayState>) {
    let (mut sender, mut receiver) = socket.split();
    let (outbound, mut events) = mpsc::channel::<ServerEvent>(state.outbound_buffer);
    let coordinator = state.coordinator.clone();
    let channel = coordinator.connect(outbound.clone());

    info!(channel = %channel, "WebSocket connection established");

    let mut send_task = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            let text = match serde_json::to_string(&event) {
                Ok(text) => text,
                Err(error) => {
                    warn!(channel = %channel, %error, "failed to encode server event");
                    continue;
                }
            };
            if sender.send(Message::Text(text)).await.is_err() {
                break;
            }
        }
    });

    let reader_coordinator = coordinator.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(frame)) = receiver.next().await {
            match frame {
                Message::Text(text) => {
                    handle_frame(&reader_coordinator, channel, &outbound, &text);
                }
                Message::Close(_) => break,
                _ => {}
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }

    coordinator.disconnect(channel);
    info!(channel = %channel, "WebSocket connection closed");
}

fn handle_frame(
    coordinator: &CoordinatorHandle,
    channel: ChannelId,
    outbound: &mpsc::Sender<ServerEvent>,
    text: &str,
) {
    match serde_json::from_str::<ClientEvent>(text) {
        Ok(event) => {
            debug!(channel = %channel, event = event.event_type_name(), "client event");
            coordinator.dispatch(channel, event);
        }
        Err(error) => {
            debug!(channel = %channel, %error, "rejecting malformed frame");
            let reply = ServerEvent::Error {
                kind: INVALID_EVENT.to_string(),
                message: error.to_string(),
            };
            if outbound.try_send(reply).is_err() {
                warn!(channel = %channel, "outbound queue full, dropping error event");
            }
        }
    }
}
