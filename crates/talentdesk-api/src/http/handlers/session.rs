//! Session history HTTP handlers.
//!
//! Endpoints:
//! - GET    /api/chat/history                - List sessions for a user
//! - GET    /api/chat/session/{id}/messages  - Get messages for a session
//! - DELETE /api/chat/session/{id}           - Delete a session
//! - PUT    /api/chat/session/{id}/title     - Rename a session

use std::time::Instant;

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use talentdesk_types::chat::{ChatMessage, SessionSummary};

use crate::http::error::AppError;
use crate::http::response::ApiResponse;
use crate::state::AppState;

/// Query parameters for session listing.
#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default = "default_limit")]
    pub limit: u32,
}

fn default_limit() -> u32 {
    50
}

/// Request body for a session rename.
#[derive(Debug, Deserialize)]
pub struct RenameRequest {
    pub title: String,
}

/// GET /api/chat/history - List session summaries, newest first.
pub async fn list_history(
    State(state): State<AppState>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<ApiResponse<Vec<SessionSummary>>>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    let sessions = state
        .chat_service
        .list_sessions(query.user_id.as_deref(), query.limit)
        .await;

    let elapsed = start.elapsed().as_millis() as u64;
    Ok(Json(ApiResponse::success(sessions, request_id, elapsed)))
}

/// GET /api/chat/session/{id}/messages - Messages of one session.
pub async fn get_messages(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<ApiResponse<Vec<ChatMessage>>>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    if state.chat_service.get_session(&session_id).await.is_none() {
        return Err(AppError::NotFound(format!("session '{session_id}' not found")));
    }

    let messages = state.chat_service.session_messages(&session_id).await;

    let elapsed = start.elapsed().as_millis() as u64;
    Ok(Json(ApiResponse::success(messages, request_id, elapsed)))
}

/// DELETE /api/chat/session/{id} - Delete a session and its turns.
pub async fn delete_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<ApiResponse<serde_json::Value>>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    let deleted = state.chat_service.delete_session(&session_id).await;

    let elapsed = start.elapsed().as_millis() as u64;
    Ok(Json(ApiResponse::success(
        serde_json::json!({"deleted": deleted}),
        request_id,
        elapsed,
    )))
}

/// PUT /api/chat/session/{id}/title - Store a title override.
pub async fn rename_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(req): Json<RenameRequest>,
) -> Result<Json<ApiResponse<serde_json::Value>>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    if req.title.trim().is_empty() {
        return Err(AppError::Validation("title must not be empty".to_string()));
    }

    let renamed = state
        .chat_service
        .rename_session(&session_id, &req.title)
        .await;
    if !renamed {
        return Err(AppError::NotFound(format!("session '{session_id}' not found")));
    }

    let elapsed = start.elapsed().as_millis() as u64;
    Ok(Json(ApiResponse::success(
        serde_json::json!({"renamed": true}),
        request_id,
        elapsed,
    )))
}
