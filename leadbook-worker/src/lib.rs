//! # Leadbook Worker Library
//!
//! Drains the notification outbox written by the API and delivers the mail.
//!
//! ## Modules
//!
//! - `config`: Environment configuration
//! - `queue`: Claiming outbox rows and recording outcomes
//! - `mailer`: SMTP and log-only delivery
//! - `dispatcher`: The polling loop tying them together
//!
//! ## Example
//!
//! ```no_run
//! use leadbook_worker::mailer::{LogMailer, Mailer};
//!
//! let mailer = LogMailer;
//! println!("Mailer: {}", mailer.name());
//! ```

pub mod config;
pub mod dispatcher;
pub mod mailer;
pub mod queue;
