//! User registration, credential updates and login

use axum::{
    extract::{rejection::JsonRejection, Extension, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
    auth::{hash_password_blocking, AuthUser},
    db::{StoreError, User},
    error::{ApiError, ApiResult},
    routes::json_body,
    state::AppState,
};

#[derive(Debug, Deserialize)]
pub struct CredentialsRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    /// Requested access token lifetime; clamped to one hour
    pub expires_in_seconds: Option<u64>,
}

/// Public view of a user
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: Uuid,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
    pub email: String,
    pub is_chirpy_red: bool,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            created_at: user.created_at,
            updated_at: user.updated_at,
            email: user.email.clone(),
            is_chirpy_red: user.is_chirpy_red,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    #[serde(flatten)]
    pub user: UserResponse,
    pub token: String,
    pub refresh_token: String,
}

fn validate_credentials(email: &str, password: &str) -> ApiResult<()> {
    if email.trim().is_empty() {
        return Err(ApiError::Validation("Email is required".into()));
    }
    if password.is_empty() {
        return Err(ApiError::Validation("Password is required".into()));
    }
    Ok(())
}

fn map_duplicate_email(e: StoreError) -> ApiError {
    match e {
        StoreError::UniqueViolation => ApiError::Conflict("Email already registered".into()),
        other => other.into(),
    }
}

pub async fn create_user(
    State(state): State<AppState>,
    payload: Result<Json<CredentialsRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<UserResponse>)> {
    let req = json_body(payload)?;
    validate_credentials(&req.email, &req.password)?;

    let hash = hash_password_blocking(req.password).await?;
    let user = state
        .users
        .create_user(req.email.trim(), &hash)
        .await
        .map_err(map_duplicate_email)?;

    tracing::info!(user_id = %user.id, "User created");
    Ok((StatusCode::CREATED, Json(UserResponse::from(&user))))
}

pub async fn update_user(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    payload: Result<Json<CredentialsRequest>, JsonRejection>,
) -> ApiResult<Json<UserResponse>> {
    let req = json_body(payload)?;
    validate_credentials(&req.email, &req.password)?;

    let hash = hash_password_blocking(req.password).await?;
    let user = state
        .users
        .update_credentials(auth_user.user_id, req.email.trim(), &hash)
        .await
        .map_err(map_duplicate_email)?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;

    tracing::info!(user_id = %user.id, "User credentials updated");
    Ok(Json(UserResponse::from(&user)))
}

pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<Json<LoginResponse>> {
    let req = json_body(payload)?;
    let session = state
        .auth
        .login(req.email.trim(), &req.password, req.expires_in_seconds)
        .await?;

    Ok(Json(LoginResponse {
        user: UserResponse::from(&session.user),
        token: session.access_token,
        refresh_token: session.refresh_token.token,
    }))
}
