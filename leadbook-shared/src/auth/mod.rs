/// Authentication and authorization
///
/// # Modules
///
/// - [`password`]: Argon2id hashing and temporary passwords for new agents
/// - [`jwt`]: access/refresh tokens (user ID only)
/// - [`caller`]: per-request [`Caller`](caller::Caller) resolution and visibility filters
/// - [`authorization`]: role gate for registry actions
/// - [`middleware`]: bearer header to `Caller`

pub mod authorization;
pub mod caller;
pub mod jwt;
pub mod middleware;
pub mod password;
