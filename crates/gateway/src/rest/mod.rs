//! REST API endpoints for the gateway

pub mod conversations;
pub mod health;

use std::sync::Arc;

use axum::{routing::get, Router};

use crate::state::GatewayState;

/// Create all REST API routes
pub fn create_rest_routes() -> Router<Arc<GatewayState>> {
    Router::new()
        .route("/health", get(health::health_check))
        .merge(conversations::create_conversation_routes())
}

pub use conversations::{ConversationsQuery, ConversationsResponse, MessagesResponse};
pub use health::HealthResponse;
