/// Middleware for the API server
///
/// - `auth`: bearer token to [`Caller`](leadbook_shared::auth::caller::Caller)
/// - `security`: security response headers

pub mod auth;
pub mod security;
