//! Chat session and turn types for Talentdesk.
//!
//! A session is one conversation thread, stored as a row keyed by an opaque
//! string id with its turns serialized into a versioned JSON blob. Summaries
//! (title, last message, counts) are derived from the blob on read, never
//! stored -- except for an optional user-supplied title override.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use std::fmt;
use std::str::FromStr;

/// Maximum derived-title length before truncation.
const TITLE_MAX_CHARS: usize = 50;

/// Maximum last-message preview length before truncation.
const LAST_MESSAGE_MAX_CHARS: usize = 100;

/// Role of a message within a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageRole::User => write!(f, "user"),
            MessageRole::Assistant => write!(f, "assistant"),
        }
    }
}

impl FromStr for MessageRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "user" => Ok(MessageRole::User),
            "assistant" => Ok(MessageRole::Assistant),
            other => Err(format!("invalid message role: '{other}'")),
        }
    }
}

/// One typed part of a structured content payload.
///
/// Agent frameworks sometimes store content as a list of typed parts
/// instead of a plain string. Only text parts carry displayable content;
/// anything else is tolerated and dropped during normalization.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ContentPart {
    Text { text: String },
    #[serde(other)]
    Other,
}

/// Turn content as stored: a plain string or a list of typed parts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TurnContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

impl TurnContent {
    /// Flatten to a single display string.
    ///
    /// Text parts are joined with single spaces; non-text parts are
    /// dropped. The structured form never leaves the store.
    pub fn normalized(&self) -> String {
        match self {
            TurnContent::Text(s) => s.clone(),
            TurnContent::Parts(parts) => parts
                .iter()
                .filter_map(|p| match p {
                    ContentPart::Text { text } => Some(text.as_str()),
                    ContentPart::Other => None,
                })
                .collect::<Vec<_>>()
                .join(" "),
        }
    }
}

/// A message as serialized inside the session blob.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredMessage {
    pub role: MessageRole,
    pub content: TurnContent,
    /// ISO-8601, non-decreasing within a session.
    pub timestamp: String,
}

/// A message as exposed to callers, with content already normalized.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
    pub timestamp: String,
}

/// Versioned container for a session's turns.
///
/// Serialized as `{"version": 1, "turns": [...]}` into a single column.
/// Readers must check [`TurnLog::is_supported`] and degrade to an empty
/// log when the version is unknown.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnLog {
    pub version: u32,
    pub turns: Vec<StoredMessage>,
}

impl TurnLog {
    /// The blob format version this build writes.
    pub const CURRENT_VERSION: u32 = 1;

    /// Create an empty log at the current version.
    pub fn new() -> Self {
        Self {
            version: Self::CURRENT_VERSION,
            turns: Vec::new(),
        }
    }

    /// Whether this build can read the log's version.
    pub fn is_supported(&self) -> bool {
        self.version <= Self::CURRENT_VERSION
    }

    /// Number of messages in the log.
    pub fn message_count(&self) -> u32 {
        self.turns.len() as u32
    }

    /// Append one user/assistant pair stamped at `now`.
    pub fn push_pair(&mut self, user_message: &str, assistant_response: &str, now: DateTime<Utc>) {
        let timestamp = now.to_rfc3339();
        self.turns.push(StoredMessage {
            role: MessageRole::User,
            content: TurnContent::Text(user_message.to_string()),
            timestamp: timestamp.clone(),
        });
        self.turns.push(StoredMessage {
            role: MessageRole::Assistant,
            content: TurnContent::Text(assistant_response.to_string()),
            timestamp,
        });
    }

    /// All messages with content normalized for display.
    pub fn messages(&self) -> Vec<ChatMessage> {
        self.turns
            .iter()
            .map(|m| ChatMessage {
                role: m.role,
                content: m.content.normalized(),
                timestamp: m.timestamp.clone(),
            })
            .collect()
    }

    /// Derived title: the first user message, truncated.
    pub fn derived_title(&self) -> Option<String> {
        self.turns
            .iter()
            .find(|m| m.role == MessageRole::User)
            .map(|m| truncate_chars(&m.content.normalized(), TITLE_MAX_CHARS))
            .filter(|t| !t.is_empty())
    }

    /// The last message's normalized content, truncated for previews.
    pub fn last_message(&self) -> Option<String> {
        self.turns
            .last()
            .map(|m| truncate_chars(&m.content.normalized(), LAST_MESSAGE_MAX_CHARS))
    }
}

impl Default for TurnLog {
    fn default() -> Self {
        Self::new()
    }
}

/// Derived per-session summary returned by listing operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSummary {
    pub session_id: String,
    pub user_id: Option<String>,
    pub title: String,
    /// ISO-8601.
    pub created_at: String,
    /// ISO-8601, absent on legacy rows.
    pub updated_at: Option<String>,
    pub message_count: u32,
    pub last_message: Option<String>,
}

impl SessionSummary {
    /// Derive a summary from a session row's fields.
    ///
    /// Title precedence: user override, then first user message, then a
    /// `Conversation {id prefix}` fallback.
    pub fn derive(
        session_id: &str,
        user_id: Option<String>,
        title_override: Option<String>,
        log: &TurnLog,
        created_at: DateTime<Utc>,
        updated_at: Option<DateTime<Utc>>,
    ) -> Self {
        let title = title_override
            .filter(|t| !t.is_empty())
            .or_else(|| log.derived_title())
            .unwrap_or_else(|| fallback_title(session_id));

        Self {
            session_id: session_id.to_string(),
            user_id,
            title,
            created_at: created_at.to_rfc3339(),
            updated_at: updated_at.map(|t| t.to_rfc3339()),
            message_count: log.message_count(),
            last_message: log.last_message(),
        }
    }
}

/// Aggregate history statistics.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HistoryStats {
    pub total_sessions: u64,
    /// Sessions created within the last 24 hours.
    pub recent_sessions: u64,
}

/// Fallback title when a session has no user message and no override.
pub fn fallback_title(session_id: &str) -> String {
    let prefix: String = session_id.chars().take(8).collect();
    format!("Conversation {prefix}")
}

/// Truncate to `max` characters, appending an ellipsis when shortened.
fn truncate_chars(s: &str, max: usize) -> String {
    if s.chars().count() > max {
        let head: String = s.chars().take(max).collect();
        format!("{head}...")
    } else {
        s.to_string()
    }
}
