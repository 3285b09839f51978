//! Conversation listing and history endpoints

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use taskdesk_chats::{ConversationSummary, Message};

use crate::error::{GatewayError, GatewayResult};
use crate::state::GatewayState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationsQuery {
    pub participant_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ConversationsResponse {
    pub success: bool,
    pub conversations: Vec<ConversationSummary>,
}

#[derive(Debug, Serialize)]
pub struct MessagesResponse {
    pub success: bool,
    pub messages: Vec<Message>,
}

pub fn create_conversation_routes() -> Router<Arc<GatewayState>> {
    Router::new()
        .route("/api/chat/conversations", get(list_conversations))
        .route("/api/chat/messages/:conversation_key", get(list_messages))
}

/// Conversations of one participant, newest activity first
pub async fn list_conversations(
    State(state): State<Arc<GatewayState>>,
    Query(query): Query<ConversationsQuery>,
) -> GatewayResult<Json<ConversationsResponse>> {
    let participant_id = query
        .participant_id
        .ok_or_else(|| GatewayError::InvalidRequest("participantId is required".to_string()))?;

    let conversations = state.conversations.list_conversations(&participant_id).await?;

    Ok(Json(ConversationsResponse {
        success: true,
        conversations,
    }))
}

/// Full history of one conversation in ascending timestamp order
pub async fn list_messages(
    State(state): State<Arc<GatewayState>>,
    Path(conversation_key): Path<String>,
) -> GatewayResult<Json<MessagesResponse>> {
    let messages = state.conversations.list_messages(&conversation_key).await?;

    Ok(Json(MessagesResponse {
        success: true,
        messages,
    }))
}
