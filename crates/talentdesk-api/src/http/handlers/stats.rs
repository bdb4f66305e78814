//! History statistics endpoint.
//!
//! GET /api/chat/stats - Aggregate session counts.

use std::time::Instant;

use axum::extract::State;
use axum::Json;
use uuid::Uuid;

use talentdesk_types::chat::HistoryStats;

use crate::http::error::AppError;
use crate::http::response::ApiResponse;
use crate::state::AppState;

/// GET /api/chat/stats - Total and recent (24h) session counts.
pub async fn get_stats(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<HistoryStats>>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    let stats = state.chat_service.stats().await;

    let elapsed = start.elapsed().as_millis() as u64;
    Ok(Json(ApiResponse::success(stats, request_id, elapsed)))
}
