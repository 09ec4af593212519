/// Database models
///
/// # Models
///
/// - `user`: login accounts (organisors and agents)
/// - `organisation`: isolation boundary, 1:1 with its organisor
/// - `agent`: salespeople, 1:1 with a non-organisor user
/// - `category`: per-organisation lead stages
/// - `lead`: prospects, optionally assigned and categorised
/// - `notification`: outgoing mail outbox
///
/// Queries over organisation-owned rows take a filter from
/// [`crate::visibility`] instead of raw IDs.

pub mod agent;
pub mod category;
pub mod lead;
pub mod notification;
pub mod organisation;
pub mod user;
