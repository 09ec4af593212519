/// API route handlers
///
/// Handlers are organized by resource:
///
/// - `health`: Health check endpoint
/// - `auth`: Signup, login and token refresh
/// - `leads`: Lead CRUD, agent assignment, category changes
/// - `agents`: Agent management (organisors only)
/// - `categories`: Category listing and management

pub mod agents;
pub mod auth;
pub mod categories;
pub mod health;
pub mod leads;

use serde::{Deserialize, Deserializer};
use validator::ValidationError;

/// Deserializes a field that distinguishes "absent" from "null"
///
/// Use with `#[serde(default, deserialize_with = "double_option")]`: an absent
/// field stays `None`, `null` becomes `Some(None)`.
pub(crate) fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Rejects values that are empty once trimmed
///
/// Names are stored trimmed, so a length check alone would let `"   "` through
/// as an empty string. Pair with a `message` on the attribute.
pub(crate) fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}
