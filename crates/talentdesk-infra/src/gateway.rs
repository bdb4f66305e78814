//! HTTP gateway to the external conversational agent.
//!
//! The agent service (hosted model + CV knowledge base + tools) sits
//! behind a plain JSON-over-HTTP contract. This client maps its HTTP
//! status codes onto [`AgentError`] so the retry loop can classify them.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use talentdesk_core::agent::{AgentReply, RecruitAgent};
use talentdesk_types::agent::AgentError;
use talentdesk_types::config::AgentGatewayConfig;

/// HTTP-backed implementation of [`RecruitAgent`].
pub struct HttpRecruitAgent {
    client: reqwest::Client,
    base_url: String,
    timeout_secs: u64,
}

#[derive(Debug, Serialize)]
struct RunRequest<'a> {
    message: &'a str,
    session_id: &'a str,
}

#[derive(Debug, Deserialize)]
struct RunResponse {
    response: String,
}

impl HttpRecruitAgent {
    /// Create a client for the configured gateway with a per-request
    /// timeout.
    pub fn new(config: &AgentGatewayConfig, request_timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .expect("failed to create reqwest client");

        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            timeout_secs: request_timeout.as_secs(),
        }
    }

    fn run_url(&self) -> String {
        format!("{}/api/agent/run", self.base_url)
    }
}

impl RecruitAgent for HttpRecruitAgent {
    async fn run(&self, prompt: &str, session_id: &str) -> Result<AgentReply, AgentError> {
        let response = self
            .client
            .post(self.run_url())
            .json(&RunRequest {
                message: prompt,
                session_id,
            })
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AgentError::Timeout(self.timeout_secs)
                } else {
                    AgentError::Network(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(match status.as_u16() {
                401 => AgentError::AuthenticationFailed,
                400 => AgentError::InvalidRequest(body),
                code => AgentError::Provider {
                    status: code,
                    message: body,
                },
            });
        }

        let parsed: RunResponse = response.json().await.map_err(|e| {
            AgentError::Stream(format!("failed to parse agent response: {e}"))
        })?;

        Ok(AgentReply::Text(parsed.response))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let config = AgentGatewayConfig {
            base_url: "http://gateway.local/".to_string(),
        };
        let agent = HttpRecruitAgent::new(&config, Duration::from_secs(30));
        assert_eq!(agent.run_url(), "http://gateway.local/api/agent/run");
    }

    #[test]
    fn test_run_request_wire_shape() {
        let req = RunRequest {
            message: "find rust devs",
            session_id: "chat_u_1",
        };
        let json = serde_json::to_string(&req).unwrap();
        assert_eq!(
            json,
            r#"{"message":"find rust devs","session_id":"chat_u_1"}"#
        );
    }
}
