//! Session service orchestrating chat turns.
//!
//! Ties a user's message to a persisted, retried, session-scoped
//! response: resolves the session id, sends through the retrying client,
//! and records the turn. History is best-effort -- a degraded store never
//! blocks the chat path, and read operations degrade to empty results.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tokio::sync::Mutex;

use talentdesk_types::chat::{ChatMessage, HistoryStats, SessionSummary};
use talentdesk_types::error::ChatServiceError;

use crate::agent::RecruitAgent;
use crate::chat::client::RetryingChatClient;
use crate::history::HistoryStore;

/// Shown when the agent produced an empty answer.
const FALLBACK_RESPONSE: &str = "I could not process your request. Please try again.";

/// Result of a handled message.
#[derive(Debug, Clone)]
pub struct ChatOutcome {
    pub response_text: String,
    pub session_id: String,
    pub timestamp: DateTime<Utc>,
}

/// Orchestration point between history store and retrying chat client.
///
/// Generic over `HistoryStore` and `RecruitAgent` to keep the core free
/// of infrastructure. Requests for the same session are serialized so
/// turns land in completion order.
pub struct SessionService<H, A> {
    history: H,
    client: RetryingChatClient<A>,
    session_locks: DashMap<String, Arc<Mutex<()>>>,
}

impl<H: HistoryStore, A: RecruitAgent> SessionService<H, A> {
    /// Create a new session service.
    pub fn new(history: H, client: RetryingChatClient<A>) -> Self {
        Self {
            history,
            client,
            session_locks: DashMap::new(),
        }
    }

    /// Access the history store.
    pub fn history(&self) -> &H {
        &self.history
    }

    /// Handle one user message within a session.
    ///
    /// Resolves the session id (synthesizing `chat_{user}_{unix_time}`
    /// when absent), sends through the retrying client, and persists the
    /// pair. On upstream failure the user-facing error text is persisted
    /// as the assistant turn so history reflects what the user saw, then
    /// the error is propagated.
    pub async fn handle_message(
        &self,
        user_id: &str,
        text: &str,
        session_id: Option<&str>,
    ) -> Result<ChatOutcome, ChatServiceError> {
        let session_id = match session_id {
            Some(id) => id.to_string(),
            None => format!("chat_{}_{}", user_id, Utc::now().timestamp()),
        };

        // One in-flight request per session id; concurrent messages on
        // the same session append in completion order.
        let lock = self
            .session_locks
            .entry(session_id.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let _guard = lock.lock().await;

        match self.client.send(text, &session_id).await {
            Ok(response) => {
                let response_text = if response.trim().is_empty() {
                    FALLBACK_RESPONSE.to_string()
                } else {
                    response
                };
                self.persist_turn(user_id, text, &response_text, &session_id)
                    .await;
                Ok(ChatOutcome {
                    response_text,
                    session_id,
                    timestamp: Utc::now(),
                })
            }
            Err(err) => {
                let service_err = ChatServiceError::from(err);
                let message = service_err.to_string();
                self.persist_turn(user_id, text, &message, &session_id).await;
                Err(service_err)
            }
        }
    }

    /// Best-effort turn persistence; failures are logged, never raised.
    async fn persist_turn(
        &self,
        user_id: &str,
        user_message: &str,
        assistant_response: &str,
        session_id: &str,
    ) {
        if let Err(err) = self
            .history
            .save_turn(user_id, user_message, assistant_response, Some(session_id))
            .await
        {
            tracing::warn!(session_id, error = %err, "failed to persist chat turn");
        }
    }

    /// List session summaries; degrades to empty on store failure.
    pub async fn list_sessions(&self, user_id: Option<&str>, limit: u32) -> Vec<SessionSummary> {
        match self.history.list_sessions(user_id, limit).await {
            Ok(sessions) => sessions,
            Err(err) => {
                tracing::warn!(error = %err, "history list failed, returning empty");
                Vec::new()
            }
        }
    }

    /// Look up one session summary; degrades to `None` on store failure.
    pub async fn get_session(&self, session_id: &str) -> Option<SessionSummary> {
        match self.history.get_session(session_id).await {
            Ok(session) => session,
            Err(err) => {
                tracing::warn!(session_id, error = %err, "history lookup failed");
                None
            }
        }
    }

    /// Messages of a session; degrades to empty on store failure.
    pub async fn session_messages(&self, session_id: &str) -> Vec<ChatMessage> {
        match self.history.get_turns(session_id).await {
            Ok(messages) => messages,
            Err(err) => {
                tracing::warn!(session_id, error = %err, "history read failed, returning empty");
                Vec::new()
            }
        }
    }

    /// Delete a session; degrades to false on store failure.
    pub async fn delete_session(&self, session_id: &str) -> bool {
        match self.history.delete_session(session_id).await {
            Ok(deleted) => {
                self.session_locks.remove(session_id);
                deleted
            }
            Err(err) => {
                tracing::warn!(session_id, error = %err, "history delete failed");
                false
            }
        }
    }

    /// Rename a session; degrades to false on store failure.
    pub async fn rename_session(&self, session_id: &str, title: &str) -> bool {
        match self.history.rename_session(session_id, title).await {
            Ok(renamed) => renamed,
            Err(err) => {
                tracing::warn!(session_id, error = %err, "history rename failed");
                false
            }
        }
    }

    /// Aggregate statistics; degrades to zeroes on store failure.
    pub async fn stats(&self) -> HistoryStats {
        match self.history.stats().await {
            Ok(stats) => stats,
            Err(err) => {
                tracing::warn!(error = %err, "history stats failed");
                HistoryStats::default()
            }
        }
    }
}
