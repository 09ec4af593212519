/// Authentication endpoints
///
/// - `POST /v1/auth/signup` - Create an organisor and their organisation
/// - `POST /v1/auth/login` - Exchange credentials for tokens
/// - `POST /v1/auth/refresh` - Exchange a refresh token for a new access token
/// - `PUT /v1/account/password` - Replace the caller's password (bearer token)

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    routes::not_blank,
};
use axum::{extract::State, http::StatusCode, Extension, Json};
use leadbook_shared::{
    auth::{caller::Caller, jwt, password},
    models::{
        organisation::{CreateOrganisation, Organisation},
        user::{CreateUser, User},
    },
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

const INVALID_CREDENTIALS: &str = "Invalid email or password";

#[derive(Debug, Deserialize, Validate)]
pub struct SignupRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Checked for strength separately
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,

    #[validate(
        length(max = 100, message = "First name must be at most 100 characters"),
        custom(function = "not_blank", message = "First name must not be blank")
    )]
    pub first_name: String,

    #[validate(
        length(max = 100, message = "Last name must be at most 100 characters"),
        custom(function = "not_blank", message = "Last name must not be blank")
    )]
    pub last_name: String,

    #[validate(
        length(max = 100, message = "Organisation name must be at most 100 characters"),
        custom(function = "not_blank", message = "Organisation name must not be blank")
    )]
    pub organisation_name: String,
}

#[derive(Debug, Serialize)]
pub struct SignupResponse {
    pub user_id: Uuid,
    pub organisation_id: Uuid,
    #[serde(flatten)]
    pub tokens: jwt::TokenPair,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub user_id: Uuid,
    pub is_organisor: bool,
    #[serde(flatten)]
    pub tokens: jwt::TokenPair,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ChangePasswordRequest {
    pub current_password: String,

    /// Checked for strength separately
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub new_password: String,
}

#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

/// Creates an organisor account
///
/// The user and the organisation are written in one transaction; a duplicate
/// email rolls back both.
///
/// # Errors
///
/// - `422 Unprocessable Entity`: Validation failed
/// - `409 Conflict`: Email already exists
pub async fn signup(
    State(state): State<AppState>,
    Json(req): Json<SignupRequest>,
) -> ApiResult<(StatusCode, Json<SignupResponse>)> {
    req.validate()?;
    password::validate_password_strength(&req.password)
        .map_err(|msg| ApiError::invalid("password", msg))?;

    let password_hash = password::hash_password(&req.password)?;

    let mut tx = state.db.begin().await?;

    let user = User::create(
        &mut *tx,
        CreateUser {
            email: req.email,
            first_name: req.first_name.trim().to_string(),
            last_name: req.last_name.trim().to_string(),
            password_hash,
            is_organisor: true,
        },
    )
    .await?;

    let organisation = Organisation::create(
        &mut *tx,
        CreateOrganisation {
            owner_id: user.id,
            name: req.organisation_name.trim().to_string(),
        },
    )
    .await?;

    tx.commit().await?;

    tracing::info!(
        user_id = %user.id,
        organisation_id = %organisation.id,
        "Organisor signed up"
    );

    let tokens = jwt::issue_pair(user.id, state.jwt_secret())?;

    Ok((
        StatusCode::CREATED,
        Json(SignupResponse {
            user_id: user.id,
            organisation_id: organisation.id,
            tokens,
        }),
    ))
}

/// Exchanges email and password for a token pair
///
/// Unknown emails and wrong passwords produce the same `401`.
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    req.validate()?;

    let user = User::find_by_email(&state.db, &req.email)
        .await?
        .ok_or_else(|| ApiError::Unauthorized(INVALID_CREDENTIALS.to_string()))?;

    if !password::verify_password(&req.password, &user.password_hash)? {
        tracing::debug!(user_id = %user.id, "Login rejected");
        return Err(ApiError::Unauthorized(INVALID_CREDENTIALS.to_string()));
    }

    let tokens = jwt::issue_pair(user.id, state.jwt_secret())?;

    Ok(Json(LoginResponse {
        user_id: user.id,
        is_organisor: user.is_organisor,
        tokens,
    }))
}

/// Issues a new access token for a valid refresh token
///
/// Refresh tokens of deleted users are rejected.
pub async fn refresh(
    State(state): State<AppState>,
    Json(req): Json<RefreshRequest>,
) -> ApiResult<Json<RefreshResponse>> {
    let claims = jwt::validate_refresh_token(&req.refresh_token, state.jwt_secret())?;

    if User::find_by_id(&state.db, claims.sub).await?.is_none() {
        return Err(ApiError::Unauthorized("Unknown user".to_string()));
    }

    let access_token = jwt::refresh_access_token(&req.refresh_token, state.jwt_secret())?;

    Ok(Json(RefreshResponse {
        access_token,
        token_type: "Bearer".to_string(),
        expires_in: jwt::TokenType::Access.lifetime().num_seconds(),
    }))
}

/// Replaces the caller's password
///
/// Agents use this to get rid of the temporary password they were invited
/// with.
///
/// # Errors
///
/// - `422 Unprocessable Entity`: Wrong current password, or a weak or
///   unchanged new one
pub async fn change_password(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Json(req): Json<ChangePasswordRequest>,
) -> ApiResult<StatusCode> {
    req.validate()?;

    let user = User::find_by_id(&state.db, caller.user_id())
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Unknown user".to_string()))?;

    if !password::verify_password(&req.current_password, &user.password_hash)? {
        return Err(ApiError::invalid("current_password", "Current password is incorrect"));
    }
    if req.new_password == req.current_password {
        return Err(ApiError::invalid(
            "new_password",
            "New password must differ from the current one",
        ));
    }
    password::validate_password_strength(&req.new_password)
        .map_err(|msg| ApiError::invalid("new_password", msg))?;

    let password_hash = password::hash_password(&req.new_password)?;
    User::set_password(&state.db, user.id, &password_hash).await?;

    tracing::info!(user_id = %user.id, "Password changed");
    Ok(StatusCode::NO_CONTENT)
}
