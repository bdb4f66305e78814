//! Infrastructure implementations for Talentdesk.
//!
//! SQLite-backed history store, HTTP agent gateway, and configuration
//! loading. Everything here implements a trait port defined in
//! `talentdesk-core`.

pub mod config;
pub mod gateway;
pub mod sqlite;
