//! Circuit breaker guarding calls to the external agent.
//!
//! Sheds load after repeated transient failures and recovers on its own
//! after a cool-down. The breaker closes fully after the timeout rather
//! than probing with a single trial, so the first post-timeout call can
//! still fail and re-trip it.

use std::sync::Mutex;
use std::time::Duration;

use tokio::time::Instant;

use talentdesk_types::config::ResilienceConfig;

/// Process-wide failure-rate tracker for the agent call path.
///
/// Constructed once at startup and shared via `Arc`; counter updates are
/// serialized behind a mutex that is never held across an await point.
pub struct CircuitBreaker {
    max_failures: u32,
    reset_timeout: Duration,
    state: Mutex<BreakerState>,
}

#[derive(Debug, Default)]
struct BreakerState {
    failure_count: u32,
    opened_at: Option<Instant>,
}

impl CircuitBreaker {
    /// Create a breaker that opens after `max_failures` consecutive
    /// failures and stays open for `reset_timeout`.
    pub fn new(max_failures: u32, reset_timeout: Duration) -> Self {
        Self {
            max_failures,
            reset_timeout,
            state: Mutex::new(BreakerState::default()),
        }
    }

    /// Create a breaker from resilience configuration.
    pub fn from_config(config: &ResilienceConfig) -> Self {
        Self::new(
            config.max_failures,
            Duration::from_secs(config.reset_timeout_secs),
        )
    }

    /// Record a failed agent call.
    ///
    /// Once the threshold is reached, every further failure re-stamps the
    /// open timestamp, extending the cool-down under sustained outage.
    pub fn record_failure(&self) {
        let mut state = self.state.lock().expect("circuit breaker lock poisoned");
        state.failure_count += 1;
        if state.failure_count >= self.max_failures {
            state.opened_at = Some(Instant::now());
        }
    }

    /// Record a successful agent call, resetting all state.
    pub fn record_success(&self) {
        let mut state = self.state.lock().expect("circuit breaker lock poisoned");
        state.failure_count = 0;
        state.opened_at = None;
    }

    /// Whether the breaker is currently rejecting calls.
    ///
    /// Self-healing: when the cool-down has elapsed the state resets to
    /// closed and this returns false.
    pub fn is_open(&self) -> bool {
        let mut state = self.state.lock().expect("circuit breaker lock poisoned");
        match state.opened_at {
            None => false,
            Some(opened_at) => {
                if opened_at.elapsed() > self.reset_timeout {
                    state.failure_count = 0;
                    state.opened_at = None;
                    false
                } else {
                    true
                }
            }
        }
    }

    /// Seconds until the breaker closes; 0 when already closed.
    pub fn remaining_timeout(&self) -> u64 {
        let state = self.state.lock().expect("circuit breaker lock poisoned");
        match state.opened_at {
            None => 0,
            Some(opened_at) => self
                .reset_timeout
                .saturating_sub(opened_at.elapsed())
                .as_secs(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn breaker(max_failures: u32, reset_secs: u64) -> CircuitBreaker {
        CircuitBreaker::new(max_failures, Duration::from_secs(reset_secs))
    }

    #[tokio::test]
    async fn test_closed_by_default() {
        let b = breaker(3, 60);
        assert!(!b.is_open());
        assert_eq!(b.remaining_timeout(), 0);
    }

    #[tokio::test]
    async fn test_opens_at_threshold() {
        let b = breaker(3, 60);
        b.record_failure();
        b.record_failure();
        assert!(!b.is_open());

        b.record_failure();
        assert!(b.is_open());
        assert!(b.remaining_timeout() > 0);
    }

    #[tokio::test]
    async fn test_success_resets_counter_and_closes() {
        let b = breaker(3, 60);
        b.record_failure();
        b.record_failure();
        b.record_failure();
        assert!(b.is_open());

        b.record_success();
        assert!(!b.is_open());
        assert_eq!(b.remaining_timeout(), 0);

        // Counter restarted from zero: two failures do not re-open.
        b.record_failure();
        b.record_failure();
        assert!(!b.is_open());
    }

    #[tokio::test(start_paused = true)]
    async fn test_self_heals_after_reset_timeout() {
        let b = breaker(2, 60);
        b.record_failure();
        b.record_failure();
        assert!(b.is_open());

        tokio::time::advance(Duration::from_secs(61)).await;
        assert!(!b.is_open());

        // State was fully reset, so the threshold applies afresh.
        b.record_failure();
        assert!(!b.is_open());
        b.record_failure();
        assert!(b.is_open());
    }

    #[tokio::test(start_paused = true)]
    async fn test_remaining_timeout_counts_down() {
        let b = breaker(1, 120);
        b.record_failure();
        assert_eq!(b.remaining_timeout(), 120);

        tokio::time::advance(Duration::from_secs(50)).await;
        assert_eq!(b.remaining_timeout(), 70);

        tokio::time::advance(Duration::from_secs(71)).await;
        assert!(!b.is_open());
        assert_eq!(b.remaining_timeout(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failures_past_threshold_extend_cooldown() {
        let b = breaker(2, 60);
        b.record_failure();
        b.record_failure();

        tokio::time::advance(Duration::from_secs(30)).await;
        b.record_failure();

        // Open window re-stamped 30s in, so 60s remain again.
        assert_eq!(b.remaining_timeout(), 60);
    }

    #[tokio::test]
    async fn test_from_config_defaults() {
        let b = CircuitBreaker::from_config(&ResilienceConfig::default());
        assert!(!b.is_open());
        for _ in 0..7 {
            b.record_failure();
        }
        assert!(!b.is_open());
        b.record_failure();
        assert!(b.is_open());
    }
}
