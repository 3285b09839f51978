//! # TaskDesk Gateway Crate
//!
//! HTTP and WebSocket surface of the conversation engine. Sockets are
//! bridged to the coordinator task; REST routes read conversation listings
//! and history from the SQLite stores.
//!
//! ## Architecture
//!
//! - **REST**: health, conversation listing and history endpoints
//! - **WebSocket**: one session per client, `GET /ws`
//! - **State**: coordinator handle plus the conversation service
//! - **Middleware**: CORS and request logging
//!
//! ## Usage
//!
//! ```rust,ignore
//! use taskdesk_gateway::{create_router, GatewayState};
//!
//! let state = GatewayState::new(coordinator, conversations);
//! let app = create_router(state);
//!
//! let listener = tokio::net::TcpListener::bind("127.0.0.1:5000").await?;
//! axum::serve(listener, app).await?;
//! ```

pub mod error;
pub mod middleware;
pub mod rest;
pub mod state;
pub mod websocket;

// Re-export main types for convenience
pub use error::{GatewayError, GatewayResult};
pub use state::{GatewayState, SqliteConversationService};

use std::sync::Arc;

use axum::{middleware as axum_middleware, Router};

/// Create the main application router with all routes
pub fn create_router(state: GatewayState) -> Router {
    let cors = middleware::create_cors_middleware(&state.allowed_origin);
    let arc_state = Arc::new(state);

    Router::new()
        // REST API routes
        .merge(rest::create_rest_routes().with_state(arc_state.clone()))
        // WebSocket routes
        .merge(websocket::create_websocket_routes().with_state(arc_state))
        .layer(cors)
        .layer(middleware::create_trace_middleware())
        .layer(axum_middleware::from_fn(middleware::logging_middleware))
}
