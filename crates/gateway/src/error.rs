//! Error types for the gateway layer

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use taskdesk_chats::ChatError;
use thiserror::Error;

/// Gateway error types
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Internal server error: {0}")]
    InternalError(String),
}

impl GatewayError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            GatewayError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            GatewayError::NotFound(_) => StatusCode::NOT_FOUND,
            GatewayError::DatabaseError(_) | GatewayError::InternalError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        let error_response = json!({
            "success": false,
            "error": self.to_string(),
        });

        (status, Json(error_response)).into_response()
    }
}

/// Result type for gateway operations
pub type GatewayResult<T> = Result<T, GatewayError>;

impl From<ChatError> for GatewayError {
    fn from(error: ChatError) -> Self {
        match error {
            ChatError::InvalidParticipant { reason } => GatewayError::InvalidRequest(reason),
            ChatError::NotAMember { key } => {
                GatewayError::InvalidRequest(format!("not a member of {key}"))
            }
            ChatError::UnresolvedConversation { key } => {
                GatewayError::NotFound(format!("conversation {key}"))
            }
            ChatError::PersistenceFailure { message } => GatewayError::DatabaseError(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_errors_map_to_http_statuses() {
        let invalid: GatewayError = ChatError::invalid_participant("participant id is empty").into();
        assert_eq!(invalid.status_code(), StatusCode::BAD_REQUEST);

        let storage: GatewayError = ChatError::persistence("disk full").into();
        assert_eq!(storage.status_code(), StatusCode::INTERNAL_SERVER_ERROR);

        let unresolved: GatewayError = ChatError::unresolved("x_y").into();
        assert_eq!(unresolved.status_code(), StatusCode::NOT_FOUND);
    }
}
