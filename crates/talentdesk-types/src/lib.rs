//! Shared domain types for Talentdesk.
//!
//! This crate contains the core domain types used across the Talentdesk
//! recruiting assistant: chat sessions and turns, agent events and errors,
//! and resilience configuration.
//!
//! Zero infrastructure dependencies -- only serde, serde_json, chrono,
//! thiserror.

pub mod agent;
pub mod chat;
pub mod config;
pub mod error;
