//! WebSocket endpoints for the gateway

pub mod session;

use std::sync::Arc;

use axum::{routing::get, Router};

use crate::state::GatewayState;

/// Create all WebSocket routes
pub fn create_websocket_routes() -> Router<Arc<GatewayState>> {
    Router::new().route("/ws", get(session::conversation_websocket_handler))
}

pub use session::conversation_websocket_handler;
