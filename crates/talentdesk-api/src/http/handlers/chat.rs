//! Chat message handler.
//!
//! POST /api/chat/message - Send a message to the recruiting assistant.

use std::time::Instant;

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::http::error::AppError;
use crate::http::response::ApiResponse;
use crate::state::AppState;

/// Request body for a chat message.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub user_id: String,
    pub message: String,
    #[serde(default)]
    pub session_id: Option<String>,
}

/// Reply payload for a handled message.
#[derive(Debug, Serialize)]
pub struct ChatReply {
    pub response: String,
    pub session_id: String,
    pub timestamp: String,
}

/// POST /api/chat/message - Route one user message through the agent.
pub async fn send_message(
    State(state): State<AppState>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ApiResponse<ChatReply>>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    if req.user_id.trim().is_empty() {
        return Err(AppError::Validation("user_id must not be empty".to_string()));
    }
    if req.message.trim().is_empty() {
        return Err(AppError::Validation("message must not be empty".to_string()));
    }

    let outcome = state
        .chat_service
        .handle_message(&req.user_id, &req.message, req.session_id.as_deref())
        .await?;

    let elapsed = start.elapsed().as_millis() as u64;

    let reply = ChatReply {
        response: outcome.response_text,
        session_id: outcome.session_id,
        timestamp: outcome.timestamp.to_rfc3339(),
    };

    Ok(Json(ApiResponse::success(reply, request_id, elapsed)))
}
