/// Bearer authentication
///
/// Turns an `Authorization: Bearer <access token>` header into a resolved
/// [`Caller`]. The HTTP layer wraps [`authenticate`] in an axum middleware and
/// inserts the caller into request extensions; handlers read it back with
/// `Extension<Caller>`.
///
/// ```no_run
/// use axum::http::HeaderMap;
/// use leadbook_shared::auth::middleware::authenticate;
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool, headers: HeaderMap) -> Result<(), Box<dyn std::error::Error>> {
/// let caller = authenticate(&pool, "jwt-secret", &headers).await?;
/// println!("{} in {}", caller.role(), caller.organisation_id());
/// # Ok(())
/// # }
/// ```

use axum::http::{header, HeaderMap};
use sqlx::PgPool;

use super::authorization::AuthzError;
use super::caller::Caller;
use super::jwt::{validate_access_token, JwtError};

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Missing authorization header")]
    MissingCredentials,

    #[error("{0}")]
    InvalidFormat(&'static str),

    #[error("Invalid token: {0}")]
    InvalidToken(#[from] JwtError),

    #[error(transparent)]
    Authz(#[from] AuthzError),
}

/// Extracts the bearer token from request headers
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or(AuthError::MissingCredentials)?
        .to_str()
        .map_err(|_| AuthError::InvalidFormat("Authorization header is not valid ASCII"))?;

    value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or(AuthError::InvalidFormat("Expected Bearer token"))
}

/// Validates the access token and resolves the caller it belongs to
pub async fn authenticate(pool: &PgPool, secret: &str, headers: &HeaderMap) -> Result<Caller, AuthError> {
    let token = bearer_token(headers)?;
    let claims = validate_access_token(token, secret)?;
    let caller = Caller::resolve(pool, claims.sub).await?;

    tracing::debug!(
        user_id = %caller.user_id(),
        role = %caller.role(),
        organisation_id = %caller.organisation_id(),
        "Caller resolved"
    );

    Ok(caller)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static(value));
        headers
    }

    #[test]
    fn test_bearer_token_extracted() {
        assert_eq!(bearer_token(&headers("Bearer abc.def.ghi")).unwrap(), "abc.def.ghi");
    }

    #[test]
    fn test_missing_header() {
        assert!(matches!(
            bearer_token(&HeaderMap::new()),
            Err(AuthError::MissingCredentials)
        ));
    }

    #[test]
    fn test_wrong_scheme_or_empty_token() {
        assert!(matches!(
            bearer_token(&headers("Basic dXNlcjpwYXNz")),
            Err(AuthError::InvalidFormat(_))
        ));
        assert!(matches!(
            bearer_token(&headers("Bearer ")),
            Err(AuthError::InvalidFormat(_))
        ));
    }
}
