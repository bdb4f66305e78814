//! SQLite history store implementation.
//!
//! Implements `HistoryStore` from `talentdesk-core` using sqlx with split
//! read/write pools. Each session is one row; its turns live in a
//! versioned JSON blob. Summaries are derived on read. A corrupt or
//! unknown-version blob degrades to an empty turn list rather than
//! failing the read.

use chrono::{DateTime, Utc};
use sqlx::Row;

use talentdesk_core::history::HistoryStore;
use talentdesk_types::chat::{ChatMessage, HistoryStats, SessionSummary, TurnLog};
use talentdesk_types::error::HistoryError;

use super::pool::DatabasePool;

/// Recency window for [`HistoryStats::recent_sessions`].
const RECENT_WINDOW_SECS: i64 = 24 * 3600;

/// SQLite-backed implementation of `HistoryStore`.
pub struct SqliteHistoryStore {
    pool: DatabasePool,
}

impl SqliteHistoryStore {
    /// Create a new store backed by the given database pool.
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

// ---------------------------------------------------------------------------
// Private Row type for SQLite-to-domain mapping
// ---------------------------------------------------------------------------

struct SessionRow {
    session_id: String,
    user_id: Option<String>,
    turns: Option<String>,
    title_override: Option<String>,
    created_at: Option<i64>,
    updated_at: Option<i64>,
}

impl SessionRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            session_id: row.try_get("session_id")?,
            user_id: row.try_get("user_id")?,
            turns: row.try_get("turns")?,
            title_override: row.try_get("title_override")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn into_summary(self) -> SessionSummary {
        let log = parse_log(&self.session_id, self.turns.as_deref());
        // Legacy rows can miss timestamps entirely; fall back to now so
        // listings stay renderable.
        let created_at = self
            .created_at
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
            .unwrap_or_else(Utc::now);
        let updated_at = self
            .updated_at
            .and_then(|secs| DateTime::from_timestamp(secs, 0));

        SessionSummary::derive(
            &self.session_id,
            self.user_id,
            self.title_override,
            &log,
            created_at,
            updated_at,
        )
    }
}

/// Parse a turns blob, degrading to an empty log on corruption or an
/// unknown format version.
fn parse_log(session_id: &str, raw: Option<&str>) -> TurnLog {
    let Some(raw) = raw.filter(|s| !s.is_empty()) else {
        return TurnLog::new();
    };
    match serde_json::from_str::<TurnLog>(raw) {
        Ok(log) if log.is_supported() => log,
        Ok(log) => {
            tracing::warn!(
                session_id,
                version = log.version,
                "unsupported turn log version, treating as empty"
            );
            TurnLog::new()
        }
        Err(err) => {
            tracing::warn!(session_id, error = %err, "corrupt turn log, treating as empty");
            TurnLog::new()
        }
    }
}

fn query_err(e: sqlx::Error) -> HistoryError {
    HistoryError::Query(e.to_string())
}

// ---------------------------------------------------------------------------
// HistoryStore implementation
// ---------------------------------------------------------------------------

impl HistoryStore for SqliteHistoryStore {
    async fn save_turn(
        &self,
        user_id: &str,
        user_message: &str,
        assistant_response: &str,
        session_id: Option<&str>,
    ) -> Result<String, HistoryError> {
        let now = Utc::now();
        let session_id = match session_id {
            Some(id) => id.to_string(),
            None => format!("chat_{}_{}", user_id, now.timestamp()),
        };

        // Create the row if this is the session's first turn. The single
        // writer connection serializes the insert-read-update sequence.
        sqlx::query(
            r#"INSERT INTO chat_sessions (session_id, user_id, turns, created_at, updated_at)
               VALUES (?, ?, ?, ?, ?)
               ON CONFLICT(session_id) DO NOTHING"#,
        )
        .bind(&session_id)
        .bind(user_id)
        .bind(serde_json::to_string(&TurnLog::new()).map_err(|e| {
            HistoryError::Serialization(e.to_string())
        })?)
        .bind(now.timestamp())
        .bind(now.timestamp())
        .execute(&self.pool.writer)
        .await
        .map_err(query_err)?;

        let row = sqlx::query("SELECT turns FROM chat_sessions WHERE session_id = ?")
            .bind(&session_id)
            .fetch_one(&self.pool.writer)
            .await
            .map_err(query_err)?;
        let raw: Option<String> = row.try_get("turns").map_err(query_err)?;

        let mut log = parse_log(&session_id, raw.as_deref());
        log.push_pair(user_message, assistant_response, now);

        let blob = serde_json::to_string(&log)
            .map_err(|e| HistoryError::Serialization(e.to_string()))?;
        sqlx::query("UPDATE chat_sessions SET turns = ?, updated_at = ? WHERE session_id = ?")
            .bind(blob)
            .bind(now.timestamp())
            .bind(&session_id)
            .execute(&self.pool.writer)
            .await
            .map_err(query_err)?;

        Ok(session_id)
    }

    async fn list_sessions(
        &self,
        user_id: Option<&str>,
        limit: u32,
    ) -> Result<Vec<SessionSummary>, HistoryError> {
        let rows = match user_id {
            Some(user_id) => {
                sqlx::query(
                    r#"SELECT * FROM chat_sessions WHERE user_id = ?
                       ORDER BY created_at DESC LIMIT ?"#,
                )
                .bind(user_id)
                .bind(limit as i64)
                .fetch_all(&self.pool.reader)
                .await
            }
            None => {
                sqlx::query("SELECT * FROM chat_sessions ORDER BY created_at DESC LIMIT ?")
                    .bind(limit as i64)
                    .fetch_all(&self.pool.reader)
                    .await
            }
        }
        .map_err(query_err)?;

        let mut sessions = Vec::with_capacity(rows.len());
        for row in &rows {
            let session_row = SessionRow::from_row(row).map_err(query_err)?;
            sessions.push(session_row.into_summary());
        }
        Ok(sessions)
    }

    async fn get_session(&self, session_id: &str) -> Result<Option<SessionSummary>, HistoryError> {
        let row = sqlx::query("SELECT * FROM chat_sessions WHERE session_id = ?")
            .bind(session_id)
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(query_err)?;

        match row {
            Some(row) => {
                let session_row = SessionRow::from_row(&row).map_err(query_err)?;
                Ok(Some(session_row.into_summary()))
            }
            None => Ok(None),
        }
    }

    async fn get_turns(&self, session_id: &str) -> Result<Vec<ChatMessage>, HistoryError> {
        let row = sqlx::query("SELECT turns FROM chat_sessions WHERE session_id = ?")
            .bind(session_id)
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(query_err)?;

        // Missing session reads as an empty conversation, never an error.
        let Some(row) = row else {
            return Ok(Vec::new());
        };
        let raw: Option<String> = row.try_get("turns").map_err(query_err)?;
        Ok(parse_log(session_id, raw.as_deref()).messages())
    }

    async fn delete_session(&self, session_id: &str) -> Result<bool, HistoryError> {
        let result = sqlx::query("DELETE FROM chat_sessions WHERE session_id = ?")
            .bind(session_id)
            .execute(&self.pool.writer)
            .await
            .map_err(query_err)?;

        Ok(result.rows_affected() > 0)
    }

    async fn rename_session(
        &self,
        session_id: &str,
        new_title: &str,
    ) -> Result<bool, HistoryError> {
        let result =
            sqlx::query("UPDATE chat_sessions SET title_override = ? WHERE session_id = ?")
                .bind(new_title)
                .bind(session_id)
                .execute(&self.pool.writer)
                .await
                .map_err(query_err)?;

        Ok(result.rows_affected() > 0)
    }

    async fn stats(&self) -> Result<HistoryStats, HistoryError> {
        let cutoff = Utc::now().timestamp() - RECENT_WINDOW_SECS;
        let row = sqlx::query(
            r#"SELECT
                COUNT(*) as total,
                SUM(CASE WHEN created_at > ? THEN 1 ELSE 0 END) as recent
            FROM chat_sessions"#,
        )
        .bind(cutoff)
        .fetch_one(&self.pool.reader)
        .await
        .map_err(query_err)?;

        let total: i64 = row.try_get("total").unwrap_or(0);
        let recent: i64 = row.try_get("recent").unwrap_or(0);

        Ok(HistoryStats {
            total_sessions: total as u64,
            recent_sessions: recent as u64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_store() -> SqliteHistoryStore {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let url = format!("sqlite://{}?mode=rwc", db_path.display());
        // Leak tempdir so it lives for the test
        std::mem::forget(dir);
        SqliteHistoryStore::new(DatabasePool::new(&url).await.unwrap())
    }

    #[tokio::test]
    async fn test_save_turn_synthesizes_session_id() {
        let store = test_store().await;
        let id = store
            .save_turn("alice@x.com", "bonjour", "Bonjour Alice", None)
            .await
            .unwrap();
        assert!(id.starts_with("chat_alice@x.com_"));
    }

    #[tokio::test]
    async fn test_n_save_turns_yield_2n_messages_in_order() {
        let store = test_store().await;
        for i in 0..5 {
            store
                .save_turn(
                    "bob",
                    &format!("question {i}"),
                    &format!("answer {i}"),
                    Some("s1"),
                )
                .await
                .unwrap();
        }

        let messages = store.get_turns("s1").await.unwrap();
        assert_eq!(messages.len(), 10);
        for i in 0..5 {
            assert_eq!(messages[2 * i].content, format!("question {i}"));
            assert_eq!(messages[2 * i].role.to_string(), "user");
            assert_eq!(messages[2 * i + 1].content, format!("answer {i}"));
            assert_eq!(messages[2 * i + 1].role.to_string(), "assistant");
        }
    }

    #[tokio::test]
    async fn test_get_turns_missing_session_is_empty() {
        let store = test_store().await;
        let messages = store.get_turns("nope").await.unwrap();
        assert!(messages.is_empty());
    }

    #[tokio::test]
    async fn test_list_sessions_filters_by_user() {
        let store = test_store().await;
        store
            .save_turn("alice", "from alice", "ok", Some("a1"))
            .await
            .unwrap();
        store
            .save_turn("bob", "from bob", "ok", Some("b1"))
            .await
            .unwrap();

        let alice_sessions = store.list_sessions(Some("alice"), 50).await.unwrap();
        assert_eq!(alice_sessions.len(), 1);
        assert_eq!(alice_sessions[0].session_id, "a1");
        assert_eq!(alice_sessions[0].user_id.as_deref(), Some("alice"));

        let all = store.list_sessions(None, 50).await.unwrap();
        assert_eq!(all.len(), 2);
    }

    #[tokio::test]
    async fn test_list_sessions_newest_first_and_limited() {
        let store = test_store().await;
        // Stamp distinct creation times by hand so ordering is decisive.
        for (id, ts) in [("old", 1_000), ("mid", 2_000), ("new", 3_000)] {
            sqlx::query(
                "INSERT INTO chat_sessions (session_id, user_id, turns, created_at, updated_at) VALUES (?, 'u', '{\"version\":1,\"turns\":[]}', ?, ?)",
            )
            .bind(id)
            .bind(ts)
            .bind(ts)
            .execute(&store.pool.writer)
            .await
            .unwrap();
        }

        let sessions = store.list_sessions(Some("u"), 2).await.unwrap();
        assert_eq!(sessions.len(), 2);
        assert_eq!(sessions[0].session_id, "new");
        assert_eq!(sessions[1].session_id, "mid");
    }

    #[tokio::test]
    async fn test_summary_derivation() {
        let store = test_store().await;
        let long_message = "a".repeat(80);
        store
            .save_turn("alice", &long_message, "short answer", Some("s1"))
            .await
            .unwrap();

        let summary = store.get_session("s1").await.unwrap().unwrap();
        assert_eq!(summary.title.chars().count(), 53);
        assert!(summary.title.ends_with("..."));
        assert_eq!(summary.message_count, 2);
        assert_eq!(summary.last_message.as_deref(), Some("short answer"));
    }

    #[tokio::test]
    async fn test_delete_session_idempotent() {
        let store = test_store().await;
        store.save_turn("u", "hi", "ok", Some("s1")).await.unwrap();

        assert!(store.delete_session("s1").await.unwrap());
        assert!(!store.delete_session("s1").await.unwrap());
        assert!(store.get_session("s1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_rename_session_surfaces_override() {
        let store = test_store().await;
        store
            .save_turn("u", "derived title source", "ok", Some("s1"))
            .await
            .unwrap();

        assert!(store.rename_session("s1", "Candidates for Rabat").await.unwrap());

        let summary = store.get_session("s1").await.unwrap().unwrap();
        assert_eq!(summary.title, "Candidates for Rabat");

        let listed = store.list_sessions(Some("u"), 10).await.unwrap();
        assert_eq!(listed[0].title, "Candidates for Rabat");
    }

    #[tokio::test]
    async fn test_rename_missing_session_returns_false() {
        let store = test_store().await;
        assert!(!store.rename_session("ghost", "title").await.unwrap());
    }

    #[tokio::test]
    async fn test_corrupt_blob_degrades_to_empty() {
        let store = test_store().await;
        sqlx::query(
            "INSERT INTO chat_sessions (session_id, user_id, turns, created_at, updated_at) VALUES ('bad', 'u', 'not json {', 1000, 1000)",
        )
        .execute(&store.pool.writer)
        .await
        .unwrap();

        let messages = store.get_turns("bad").await.unwrap();
        assert!(messages.is_empty());

        let summary = store.get_session("bad").await.unwrap().unwrap();
        assert_eq!(summary.message_count, 0);
        assert_eq!(summary.title, "Conversation bad");

        // The next save replaces the corrupt blob wholesale.
        store.save_turn("u", "hello", "world", Some("bad")).await.unwrap();
        let messages = store.get_turns("bad").await.unwrap();
        assert_eq!(messages.len(), 2);
    }

    #[tokio::test]
    async fn test_future_version_blob_degrades_to_empty() {
        let store = test_store().await;
        sqlx::query(
            "INSERT INTO chat_sessions (session_id, turns, created_at, updated_at) VALUES ('v9', '{\"version\":9,\"turns\":[]}', 1000, 1000)",
        )
        .execute(&store.pool.writer)
        .await
        .unwrap();

        assert!(store.get_turns("v9").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_structured_parts_content_normalized_on_read() {
        let store = test_store().await;
        let blob = r#"{"version":1,"turns":[
            {"role":"user","content":"find rust devs","timestamp":"2025-01-01T00:00:00Z"},
            {"role":"assistant","content":[{"type":"text","text":"Found"},{"type":"text","text":"two."},{"type":"image","ref":"x"}],"timestamp":"2025-01-01T00:00:01Z"}
        ]}"#;
        sqlx::query(
            "INSERT INTO chat_sessions (session_id, user_id, turns, created_at, updated_at) VALUES ('parts', 'u', ?, 1000, 1000)",
        )
        .bind(blob)
        .execute(&store.pool.writer)
        .await
        .unwrap();

        let messages = store.get_turns("parts").await.unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[1].content, "Found two.");
    }

    #[tokio::test]
    async fn test_stats_recency_window() {
        let store = test_store().await;
        let now = Utc::now().timestamp();
        for (id, ts) in [("fresh", now - 60), ("stale", now - 3 * 24 * 3600)] {
            sqlx::query(
                "INSERT INTO chat_sessions (session_id, turns, created_at, updated_at) VALUES (?, '{\"version\":1,\"turns\":[]}', ?, ?)",
            )
            .bind(id)
            .bind(ts)
            .bind(ts)
            .execute(&store.pool.writer)
            .await
            .unwrap();
        }

        let stats = store.stats().await.unwrap();
        assert_eq!(stats.total_sessions, 2);
        assert_eq!(stats.recent_sessions, 1);
    }

    #[tokio::test]
    async fn test_updated_at_bumps_on_save() {
        let store = test_store().await;
        sqlx::query(
            "INSERT INTO chat_sessions (session_id, user_id, turns, created_at, updated_at) VALUES ('s1', 'u', '{\"version\":1,\"turns\":[]}', 1000, 1000)",
        )
        .execute(&store.pool.writer)
        .await
        .unwrap();

        store.save_turn("u", "hi", "ok", Some("s1")).await.unwrap();

        let summary = store.get_session("s1").await.unwrap().unwrap();
        let updated: DateTime<Utc> = summary.updated_at.unwrap().parse::<DateTime<Utc>>().unwrap();
        assert!(updated.timestamp() > 1000);
        // created_at untouched by appends.
        let created: DateTime<Utc> = summary.created_at.parse::<DateTime<Utc>>().unwrap();
        assert_eq!(created.timestamp(), 1000);
    }
}
