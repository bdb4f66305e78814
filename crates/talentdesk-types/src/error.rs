use thiserror::Error;

use crate::agent::AgentError;

/// Errors from history store operations (used by trait definitions in
/// talentdesk-core).
#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("database connection error")]
    Connection,

    #[error("query error: {0}")]
    Query(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Errors surfaced by the retrying chat client.
#[derive(Debug, Error)]
pub enum ChatClientError {
    /// The circuit breaker is open; no upstream call was attempted.
    #[error("service limited, retry in {retry_in_secs} seconds")]
    ServiceLimited { retry_in_secs: u64 },

    /// Transient failures exhausted all retry attempts.
    #[error("service unavailable after {attempts} attempts: {source}")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        source: AgentError,
    },

    /// Non-retryable failure, surfaced after a single attempt.
    #[error(transparent)]
    Terminal(AgentError),
}

/// User-facing errors from the session service.
///
/// Display output is shown to end users verbatim; keep it human-readable
/// and free of internals.
#[derive(Debug, Error)]
pub enum ChatServiceError {
    #[error("Service temporarily limited due to overload. Retry in {retry_in_secs} seconds.")]
    ServiceLimited { retry_in_secs: u64 },

    #[error("Sorry, the service is temporarily overloaded. Please try again in a few minutes.")]
    Overloaded,

    #[error("An error occurred: {0}")]
    Agent(String),
}

impl From<ChatClientError> for ChatServiceError {
    fn from(err: ChatClientError) -> Self {
        match err {
            ChatClientError::ServiceLimited { retry_in_secs } => {
                ChatServiceError::ServiceLimited { retry_in_secs }
            }
            ChatClientError::RetriesExhausted { .. } => ChatServiceError::Overloaded,
            ChatClientError::Terminal(e) => ChatServiceError::Agent(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_history_error_display() {
        let err = HistoryError::Query("syntax error".to_string());
        assert_eq!(err.to_string(), "query error: syntax error");
    }

    #[test]
    fn test_service_limited_message_carries_remaining_seconds() {
        let err = ChatServiceError::ServiceLimited { retry_in_secs: 42 };
        assert!(err.to_string().contains("42 seconds"));
    }

    #[test]
    fn test_retries_exhausted_maps_to_overloaded() {
        let client_err = ChatClientError::RetriesExhausted {
            attempts: 4,
            source: AgentError::Provider {
                status: 429,
                message: "rate limited".to_string(),
            },
        };
        let service_err: ChatServiceError = client_err.into();
        assert!(matches!(service_err, ChatServiceError::Overloaded));
    }

    #[test]
    fn test_terminal_maps_to_agent_message() {
        let client_err = ChatClientError::Terminal(AgentError::AuthenticationFailed);
        let service_err: ChatServiceError = client_err.into();
        match service_err {
            ChatServiceError::Agent(msg) => assert!(msg.contains("authentication failed")),
            other => panic!("expected Agent, got {other:?}"),
        }
    }
}
