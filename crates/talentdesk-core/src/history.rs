//! HistoryStore trait definition.
//!
//! Durable record of all conversation turns, queryable per user and per
//! session. Implementations live in talentdesk-infra (e.g.
//! `SqliteHistoryStore`). Uses native async fn in traits (RPITIT,
//! Rust 2024 edition).

use talentdesk_types::chat::{ChatMessage, HistoryStats, SessionSummary};
use talentdesk_types::error::HistoryError;

/// Repository trait for session and turn persistence.
pub trait HistoryStore: Send + Sync {
    /// Append one user/assistant pair to a session, creating the session
    /// row if absent.
    ///
    /// When `session_id` is `None` a fresh id is synthesized from the
    /// user and the current time. Returns the resolved session id so
    /// callers can continue the conversation.
    fn save_turn(
        &self,
        user_id: &str,
        user_message: &str,
        assistant_response: &str,
        session_id: Option<&str>,
    ) -> impl std::future::Future<Output = Result<String, HistoryError>> + Send;

    /// List session summaries, newest first by creation time.
    ///
    /// With a `user_id`, only that user's sessions are returned.
    fn list_sessions(
        &self,
        user_id: Option<&str>,
        limit: u32,
    ) -> impl std::future::Future<Output = Result<Vec<SessionSummary>, HistoryError>> + Send;

    /// Look up a single session summary.
    fn get_session(
        &self,
        session_id: &str,
    ) -> impl std::future::Future<Output = Result<Option<SessionSummary>, HistoryError>> + Send;

    /// All messages of a session in conversation order, content
    /// normalized. Empty when the session is absent or has no turns.
    fn get_turns(
        &self,
        session_id: &str,
    ) -> impl std::future::Future<Output = Result<Vec<ChatMessage>, HistoryError>> + Send;

    /// Delete a session. Returns false when no row matched; calling
    /// twice is not an error.
    fn delete_session(
        &self,
        session_id: &str,
    ) -> impl std::future::Future<Output = Result<bool, HistoryError>> + Send;

    /// Store a title override independent of the derived title.
    /// Returns false when the session is absent.
    fn rename_session(
        &self,
        session_id: &str,
        new_title: &str,
    ) -> impl std::future::Future<Output = Result<bool, HistoryError>> + Send;

    /// Aggregate counts over all sessions.
    fn stats(
        &self,
    ) -> impl std::future::Future<Output = Result<HistoryStats, HistoryError>> + Send;
}
