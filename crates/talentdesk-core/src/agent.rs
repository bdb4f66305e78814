//! RecruitAgent trait definition and reply normalization.
//!
//! The external conversational agent (hosted model + CV knowledge base +
//! tools) is consumed only through this port. Replies arrive either as a
//! complete text or as a stream of tagged events; [`collect_reply_text`]
//! flattens both shapes into the single string the rest of the system
//! works with.

use std::pin::Pin;

use futures_util::{Stream, StreamExt};

use talentdesk_types::agent::{AgentError, AgentEvent};

/// Stream of incremental agent events.
///
/// Item-level errors are degraded to inline error text during
/// normalization rather than aborting the whole reply.
pub type AgentEventStream =
    Pin<Box<dyn Stream<Item = Result<AgentEvent, AgentError>> + Send + 'static>>;

/// Reply shapes the external agent can produce.
pub enum AgentReply {
    /// The whole answer in one value.
    Text(String),
    /// Incremental events tagged with finality.
    Stream(AgentEventStream),
}

impl std::fmt::Debug for AgentReply {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AgentReply::Text(text) => f.debug_tuple("Text").field(text).finish(),
            AgentReply::Stream(_) => f.debug_tuple("Stream").field(&"<stream>").finish(),
        }
    }
}

/// The external conversational agent behind the chat path.
///
/// Implementations live in talentdesk-infra (e.g. `HttpRecruitAgent`).
/// Uses native async fn in traits (RPITIT, Rust 2024 edition).
pub trait RecruitAgent: Send + Sync {
    /// Run one prompt within a session and return the agent's reply.
    fn run(
        &self,
        prompt: &str,
        session_id: &str,
    ) -> impl std::future::Future<Output = Result<AgentReply, AgentError>> + Send;
}

/// Flatten a reply into one string.
///
/// Only final-answer events contribute text, concatenated in arrival
/// order. Intermediate content and tool calls are dropped. A stream item
/// that fails to resolve becomes an inline error marker instead of
/// propagating.
pub async fn collect_reply_text(reply: AgentReply) -> String {
    match reply {
        AgentReply::Text(text) => text,
        AgentReply::Stream(mut stream) => {
            let mut out = String::new();
            while let Some(item) = stream.next().await {
                match item {
                    Ok(AgentEvent::FinalAnswer { text }) => out.push_str(&text),
                    Ok(AgentEvent::Intermediate { .. }) | Ok(AgentEvent::ToolCall { .. }) => {}
                    Err(err) => {
                        tracing::warn!(error = %err, "agent stream item failed to resolve");
                        out.push_str(&format!("[error: {err}]"));
                    }
                }
            }
            out
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_collect_plain_text() {
        let text = collect_reply_text(AgentReply::Text("Bonjour".to_string())).await;
        assert_eq!(text, "Bonjour");
    }

    #[tokio::test]
    async fn test_collect_keeps_only_final_answer_chunks() {
        let stream: AgentEventStream = Box::pin(async_stream::stream! {
            yield Ok(AgentEvent::Intermediate { text: "thinking...".to_string() });
            yield Ok(AgentEvent::ToolCall {
                name: "search_cvs".to_string(),
                input: serde_json::json!({"query": "rust"}),
            });
            yield Ok(AgentEvent::FinalAnswer { text: "Here are ".to_string() });
            yield Ok(AgentEvent::FinalAnswer { text: "3 candidates.".to_string() });
        });

        let text = collect_reply_text(AgentReply::Stream(stream)).await;
        assert_eq!(text, "Here are 3 candidates.");
    }

    #[tokio::test]
    async fn test_failed_item_becomes_inline_error_text() {
        let stream: AgentEventStream = Box::pin(async_stream::stream! {
            yield Ok(AgentEvent::FinalAnswer { text: "partial ".to_string() });
            yield Err(AgentError::Stream("chunk decode failed".to_string()));
            yield Ok(AgentEvent::FinalAnswer { text: "answer".to_string() });
        });

        let text = collect_reply_text(AgentReply::Stream(stream)).await;
        assert!(text.starts_with("partial "));
        assert!(text.contains("[error: agent stream error: chunk decode failed]"));
        assert!(text.ends_with("answer"));
    }

    #[tokio::test]
    async fn test_empty_stream_yields_empty_string() {
        let stream: AgentEventStream = Box::pin(futures_util::stream::empty());
        let text = collect_reply_text(AgentReply::Stream(stream)).await;
        assert!(text.is_empty());
    }
}
