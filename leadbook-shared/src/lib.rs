//! # Leadbook Shared Library
//!
//! Domain code used by both the API server and the notification worker.
//!
//! ## Module Organization
//!
//! - `models`: database models and their queries
//! - `visibility`: organisation-scoped filters every query runs through
//! - `auth`: passwords, tokens, caller resolution and the role gate
//! - `notify`: notification outbox and message builders
//! - `db`: pool and migrations

pub mod auth;
pub mod db;
pub mod models;
pub mod notify;
pub mod visibility;

/// Current version of the Leadbook shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
