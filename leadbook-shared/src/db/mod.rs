/// Database plumbing
///
/// - `pool`: connection pool construction and health checks
/// - `migrations`: embedded schema migrations
///
/// Models live in [`crate::models`].

pub mod migrations;
pub mod pool;
