//! Runtime configuration for Talentdesk.
//!
//! Deserialized from `{data_dir}/config.toml` by the infrastructure
//! loader. Every field has a default so a missing or partial file still
//! yields a working configuration.

use serde::{Deserialize, Serialize};

/// Retry and circuit-breaker tuning for agent calls.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResilienceConfig {
    /// Consecutive transient failures before the breaker opens.
    #[serde(default = "default_max_failures")]
    pub max_failures: u32,

    /// Seconds the breaker stays open before closing again.
    #[serde(default = "default_reset_timeout_secs")]
    pub reset_timeout_secs: u64,

    /// Attempts per send, including the first.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Base backoff delay in milliseconds; doubles per attempt with jitter.
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,

    /// Per-attempt upstream timeout in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_max_failures() -> u32 {
    8
}

fn default_reset_timeout_secs() -> u64 {
    180
}

fn default_max_retries() -> u32 {
    4
}

fn default_base_delay_ms() -> u64 {
    1500
}

fn default_request_timeout_secs() -> u64 {
    30
}

impl Default for ResilienceConfig {
    fn default() -> Self {
        Self {
            max_failures: default_max_failures(),
            reset_timeout_secs: default_reset_timeout_secs(),
            max_retries: default_max_retries(),
            base_delay_ms: default_base_delay_ms(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

/// Location of the external agent gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentGatewayConfig {
    /// Base URL of the agent gateway service.
    #[serde(default = "default_gateway_url")]
    pub base_url: String,
}

fn default_gateway_url() -> String {
    "http://127.0.0.1:8800".to_string()
}

impl Default for AgentGatewayConfig {
    fn default() -> Self {
        Self {
            base_url: default_gateway_url(),
        }
    }
}

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub resilience: ResilienceConfig,

    #[serde(default)]
    pub gateway: AgentGatewayConfig,
}
