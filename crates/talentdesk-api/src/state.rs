//! Application state wiring all services together.
//!
//! AppState pins the generic core services to their concrete infra
//! implementations and holds the single circuit breaker instance for the
//! process. Everything is constructed once at startup and shared via Arc.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use talentdesk_core::chat::breaker::CircuitBreaker;
use talentdesk_core::chat::client::RetryingChatClient;
use talentdesk_core::chat::service::SessionService;
use talentdesk_infra::config::{load_config, resolve_data_dir};
use talentdesk_infra::gateway::HttpRecruitAgent;
use talentdesk_infra::sqlite::history::SqliteHistoryStore;
use talentdesk_infra::sqlite::pool::DatabasePool;

/// Concrete type alias for the service generics pinned to infra
/// implementations.
pub type ConcreteSessionService = SessionService<SqliteHistoryStore, HttpRecruitAgent>;

/// Shared application state holding all services.
#[derive(Clone)]
pub struct AppState {
    pub chat_service: Arc<ConcreteSessionService>,
    pub data_dir: PathBuf,
}

impl AppState {
    /// Initialize the application state: connect to DB, wire services.
    pub async fn init() -> anyhow::Result<Self> {
        let data_dir = resolve_data_dir();

        // Ensure data directory exists
        tokio::fs::create_dir_all(&data_dir).await?;

        let config = load_config(&data_dir).await;

        // Initialize database
        let db_url = format!(
            "sqlite://{}?mode=rwc",
            data_dir.join("talentdesk.db").display()
        );
        let db_pool = DatabasePool::new(&db_url).await?;
        let history = SqliteHistoryStore::new(db_pool);

        // One breaker for the process lifetime, shared across requests.
        let breaker = Arc::new(CircuitBreaker::from_config(&config.resilience));

        let agent = HttpRecruitAgent::new(
            &config.gateway,
            Duration::from_secs(config.resilience.request_timeout_secs),
        );
        let client = RetryingChatClient::new(agent, breaker, &config.resilience);
        let chat_service = SessionService::new(history, client);

        Ok(Self {
            chat_service: Arc::new(chat_service),
            data_dir,
        })
    }
}
