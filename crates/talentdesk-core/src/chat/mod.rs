//! Chat resilience and orchestration for Talentdesk.
//!
//! The circuit breaker guards the external agent, the retrying client
//! wraps each call with backoff, and the session service ties a user's
//! message to a persisted, session-scoped response.

pub mod breaker;
pub mod client;
pub mod service;
