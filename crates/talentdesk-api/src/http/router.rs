//! Axum router configuration with middleware.
//!
//! All routes are under `/api/chat/`.
//! Middleware: CORS, request tracing.

use axum::routing::{delete, get, post, put};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::http::handlers;
use crate::state::AppState;

/// Build the complete API router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        .route("/chat/message", post(handlers::chat::send_message))
        .route("/chat/history", get(handlers::session::list_history))
        .route(
            "/chat/session/{id}/messages",
            get(handlers::session::get_messages),
        )
        .route(
            "/chat/session/{id}",
            delete(handlers::session::delete_session),
        )
        .route(
            "/chat/session/{id}/title",
            put(handlers::session::rename_session),
        )
        .route("/chat/stats", get(handlers::stats::get_stats));

    Router::new()
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
