//! Application error type mapping to HTTP status codes and envelope format.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use talentdesk_types::error::ChatServiceError;

/// Application-level error that maps to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    /// Chat orchestration errors (already user-facing).
    Chat(ChatServiceError),
    /// Requested entity does not exist.
    NotFound(String),
    /// Validation error.
    Validation(String),
    /// Generic internal error.
    Internal(String),
}

impl From<ChatServiceError> for AppError {
    fn from(e: ChatServiceError) -> Self {
        AppError::Chat(e)
    }
}

impl AppError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::Chat(ChatServiceError::ServiceLimited { .. }) => {
                (StatusCode::SERVICE_UNAVAILABLE, "SERVICE_LIMITED")
            }
            AppError::Chat(ChatServiceError::Overloaded) => {
                (StatusCode::SERVICE_UNAVAILABLE, "OVERLOADED")
            }
            AppError::Chat(ChatServiceError::Agent(_)) => (StatusCode::BAD_GATEWAY, "AGENT_ERROR"),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }

    fn message(&self) -> String {
        match self {
            AppError::Chat(e) => e.to_string(),
            AppError::NotFound(msg) | AppError::Validation(msg) | AppError::Internal(msg) => {
                msg.clone()
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let body = json!({
            "data": null,
            "meta": {
                "request_id": "",
                "timestamp": chrono::Utc::now().to_rfc3339(),
                "response_time_ms": 0
            },
            "errors": [{
                "code": code,
                "message": self.message(),
            }]
        });

        (
            status,
            [(axum::http::header::CONTENT_TYPE, "application/json")],
            body.to_string(),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_limited_maps_to_503() {
        let err = AppError::Chat(ChatServiceError::ServiceLimited { retry_in_secs: 90 });
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_overloaded_maps_to_503() {
        let err = AppError::Chat(ChatServiceError::Overloaded);
        assert_eq!(
            err.into_response().status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn test_agent_error_maps_to_502() {
        let err = AppError::Chat(ChatServiceError::Agent("boom".to_string()));
        assert_eq!(err.into_response().status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_validation_maps_to_400() {
        let err = AppError::Validation("message must not be empty".to_string());
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_not_found_maps_to_404() {
        let err = AppError::NotFound("session not found".to_string());
        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
    }
}
