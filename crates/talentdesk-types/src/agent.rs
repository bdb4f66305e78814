//! Agent event and error types for Talentdesk.
//!
//! These types model the data shapes coming back from the external
//! conversational agent (model + CV knowledge base + tools): incremental
//! events, provider errors, and the transient/terminal classification
//! consumed by the retry loop.

use serde::{Deserialize, Serialize};

/// Events emitted by the agent while producing a response.
///
/// Only [`AgentEvent::FinalAnswer`] contributes text to the normalized
/// response; intermediate content and tool calls are dropped.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AgentEvent {
    /// Final-answer content, concatenated in arrival order.
    FinalAnswer { text: String },

    /// Intermediate reasoning or progress content.
    Intermediate { text: String },

    /// A tool invocation surfaced by the agent framework.
    ToolCall {
        name: String,
        input: serde_json::Value,
    },
}

/// Errors from agent operations.
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    #[error("agent gateway error {status}: {message}")]
    Provider { status: u16, message: String },

    #[error("network error: {0}")]
    Network(String),

    #[error("agent call timed out after {0} seconds")]
    Timeout(u64),

    #[error("agent stream error: {0}")]
    Stream(String),

    #[error("authentication failed")]
    AuthenticationFailed,

    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

/// Retry classification of an agent error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Expected to resolve shortly; retried and counted toward the
    /// circuit breaker.
    Transient,
    /// Will not resolve by retrying; surfaced after one attempt.
    Terminal,
}

impl AgentError {
    /// Map an error to its retry classification.
    ///
    /// Rate-limit and overload statuses, timeouts, stream breakage, and
    /// network failures are transient. Auth and request-shape errors are
    /// terminal, as are unrecognized provider statuses.
    pub fn class(&self) -> ErrorClass {
        match self {
            AgentError::Provider { status, .. } => match status {
                429 | 500 | 503 | 529 => ErrorClass::Transient,
                _ => ErrorClass::Terminal,
            },
            AgentError::Network(_) | AgentError::Timeout(_) | AgentError::Stream(_) => {
                ErrorClass::Transient
            }
            AgentError::AuthenticationFailed | AgentError::InvalidRequest(_) => {
                ErrorClass::Terminal
            }
        }
    }
}
