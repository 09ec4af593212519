//! # Leadbook API Server Library
//!
//! HTTP surface of the lead tracker: organisor signup and login, and the
//! role-scoped lead, agent and category endpoints.
//!
//! ## Modules
//!
//! - `app`: Application state and router builder
//! - `config`: Configuration management
//! - `error`: Error handling and HTTP response mapping
//! - `middleware`: Caller resolution and security headers
//! - `routes`: API route handlers

pub mod app;
pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
