//! Retrying chat client around the external agent.
//!
//! Wraps every agent call with a per-attempt timeout, exponential backoff
//! with jitter for transient provider errors, and circuit-breaker gating
//! so a saturated upstream is not hammered further.

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;

use talentdesk_types::agent::{AgentError, ErrorClass};
use talentdesk_types::config::ResilienceConfig;
use talentdesk_types::error::ChatClientError;

use crate::agent::{collect_reply_text, RecruitAgent};
use crate::chat::breaker::CircuitBreaker;

/// Lower jitter multiplier bound.
const JITTER_MIN: f64 = 0.8;
/// Upper jitter multiplier bound.
const JITTER_MAX: f64 = 1.2;

/// Resilient client for the external conversational agent.
pub struct RetryingChatClient<A> {
    agent: A,
    breaker: Arc<CircuitBreaker>,
    max_retries: u32,
    base_delay: Duration,
    request_timeout: Duration,
}

impl<A: RecruitAgent> RetryingChatClient<A> {
    /// Create a client from an agent, a shared breaker, and resilience
    /// configuration.
    pub fn new(agent: A, breaker: Arc<CircuitBreaker>, config: &ResilienceConfig) -> Self {
        Self {
            agent,
            breaker,
            max_retries: config.max_retries.max(1),
            base_delay: Duration::from_millis(config.base_delay_ms),
            request_timeout: Duration::from_secs(config.request_timeout_secs),
        }
    }

    /// The breaker this client reports into.
    pub fn breaker(&self) -> &Arc<CircuitBreaker> {
        &self.breaker
    }

    /// Send one prompt through the agent and return the normalized text.
    ///
    /// Fails fast when the breaker is open. Transient errors (rate limit,
    /// overload, timeout) are retried with exponential backoff and
    /// recorded against the breaker; terminal errors surface after a
    /// single attempt.
    pub async fn send(&self, prompt: &str, session_id: &str) -> Result<String, ChatClientError> {
        if self.breaker.is_open() {
            let retry_in_secs = self.breaker.remaining_timeout();
            tracing::warn!(session_id, retry_in_secs, "circuit open, rejecting chat call");
            return Err(ChatClientError::ServiceLimited { retry_in_secs });
        }

        let mut attempt: u32 = 0;
        loop {
            let outcome =
                tokio::time::timeout(self.request_timeout, self.agent.run(prompt, session_id))
                    .await;

            let err = match outcome {
                Ok(Ok(reply)) => {
                    let text = collect_reply_text(reply).await;
                    self.breaker.record_success();
                    return Ok(text);
                }
                Ok(Err(err)) => err,
                Err(_) => AgentError::Timeout(self.request_timeout.as_secs()),
            };

            if err.class() == ErrorClass::Terminal {
                tracing::error!(session_id, error = %err, "terminal agent error");
                return Err(ChatClientError::Terminal(err));
            }

            self.breaker.record_failure();
            attempt += 1;

            if attempt >= self.max_retries {
                tracing::error!(
                    session_id,
                    attempts = attempt,
                    error = %err,
                    "retries exhausted"
                );
                return Err(ChatClientError::RetriesExhausted {
                    attempts: attempt,
                    source: err,
                });
            }

            let delay = backoff_delay(self.base_delay, attempt - 1);
            tracing::warn!(
                session_id,
                attempt,
                delay_ms = delay.as_millis() as u64,
                error = %err,
                "transient agent error, retrying after backoff"
            );
            tokio::time::sleep(delay).await;
        }
    }
}

/// Backoff for the given zero-based attempt: `base * 2^attempt * jitter`,
/// jitter uniform in [0.8, 1.2] to spread synchronized retries.
pub fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    let jitter = rand::rng().random_range(JITTER_MIN..=JITTER_MAX);
    base.mul_f64(2f64.powi(attempt as i32) * jitter)
}
