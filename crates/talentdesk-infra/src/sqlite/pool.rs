//! Database pool with split reader/writer connections in WAL mode.
//!
//! SQLite allows only one writer at a time. This module provides a
//! `DatabasePool` with a multi-connection reader pool for concurrent reads
//! and a single-connection writer pool for serialized writes. Both use WAL
//! journal mode and enforce foreign keys.
//!
//! The schema is bootstrapped on open: the sessions table is created if
//! missing, and legacy tables that predate some columns are patched with
//! additive `ALTER TABLE` statements.

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use sqlx::Row;
use std::str::FromStr;

/// Split read/write pool for SQLite with WAL mode.
///
/// - `reader`: Multi-connection pool (up to 8) for concurrent SELECT queries.
/// - `writer`: Single-connection pool for serialized INSERT/UPDATE/DELETE.
#[derive(Clone)]
pub struct DatabasePool {
    pub reader: SqlitePool,
    pub writer: SqlitePool,
}

impl DatabasePool {
    /// Create a new DatabasePool with split reader/writer connections.
    ///
    /// Bootstraps the schema on the writer pool before opening the reader
    /// pool. Both pools use WAL journal mode, foreign key enforcement, and
    /// a 5-second busy timeout.
    pub async fn new(database_url: &str) -> Result<Self, sqlx::Error> {
        let base_opts = SqliteConnectOptions::from_str(database_url)?
            .journal_mode(SqliteJournalMode::Wal)
            .foreign_keys(true)
            .busy_timeout(std::time::Duration::from_secs(5))
            .create_if_missing(true);

        let read_opts = base_opts.clone().read_only(true);
        let write_opts = base_opts;

        let writer = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(write_opts)
            .await?;

        bootstrap_schema(&writer).await?;

        let reader = SqlitePoolOptions::new()
            .max_connections(8)
            .connect_with(read_opts)
            .await?;

        Ok(Self { reader, writer })
    }
}

/// Create the sessions table and patch legacy schemas.
///
/// Pre-existing databases may lack columns added over time; SQLite cannot
/// grow a table through `CREATE TABLE IF NOT EXISTS`, so the actual column
/// set is probed and missing ones are added in place.
async fn bootstrap_schema(writer: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"CREATE TABLE IF NOT EXISTS chat_sessions (
            session_id TEXT PRIMARY KEY,
            user_id TEXT,
            turns TEXT,
            title_override TEXT,
            created_at INTEGER,
            updated_at INTEGER
        )"#,
    )
    .execute(writer)
    .await?;

    let rows = sqlx::query("PRAGMA table_info(chat_sessions)")
        .fetch_all(writer)
        .await?;
    let existing: Vec<String> = rows
        .iter()
        .filter_map(|row| row.try_get::<String, _>("name").ok())
        .collect();

    for (column, ddl) in [
        ("user_id", "ALTER TABLE chat_sessions ADD COLUMN user_id TEXT"),
        (
            "title_override",
            "ALTER TABLE chat_sessions ADD COLUMN title_override TEXT",
        ),
        (
            "created_at",
            "ALTER TABLE chat_sessions ADD COLUMN created_at INTEGER",
        ),
        (
            "updated_at",
            "ALTER TABLE chat_sessions ADD COLUMN updated_at INTEGER",
        ),
    ] {
        if !existing.iter().any(|c| c == column) {
            tracing::info!(column, "adding missing chat_sessions column");
            sqlx::query(ddl).execute(writer).await?;
        }
    }

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_chat_sessions_created_at ON chat_sessions(created_at)",
    )
    .execute(writer)
    .await?;

    Ok(())
}

/// Returns the default database URL based on `TALENTDESK_DATA_DIR` env var,
/// falling back to `~/.talentdesk/talentdesk.db`.
pub fn default_database_url() -> String {
    let data_dir = std::env::var("TALENTDESK_DATA_DIR").unwrap_or_else(|_| {
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
        format!("{home}/.talentdesk")
    });
    format!("sqlite://{data_dir}/talentdesk.db")
}
