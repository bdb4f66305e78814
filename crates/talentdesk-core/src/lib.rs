//! Business logic and trait ports for Talentdesk.
//!
//! This crate defines the "ports" (the [`history::HistoryStore`] and
//! [`agent::RecruitAgent`] traits) that the infrastructure layer
//! implements, plus the resilience and orchestration logic built on top:
//! circuit breaker, retrying chat client, and session service. It depends
//! only on `talentdesk-types` -- never on a database or HTTP crate.

pub mod agent;
pub mod chat;
pub mod history;
