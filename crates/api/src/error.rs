//! API error type and its JSON rendering
//!
//! Every error body has the shape `{"error": "<message>"}`. Server-side
//! failures are logged with their cause and rendered with a generic message.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::auth::{AuthError, PasswordError, RefreshTokenError};
use crate::db::StoreError;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("Forbidden")]
    Forbidden,
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("Database error: {0}")]
    Database(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Database(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn unauthorized() -> Self {
        ApiError::Unauthorized("Unauthorized".to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            ApiError::Database(cause) | ApiError::Internal(cause) => {
                tracing::error!(error = %cause, "Request failed");
                "Something went wrong".to_string()
            }
            other => other.to_string(),
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::UniqueViolation => ApiError::Conflict("Resource already exists".into()),
            StoreError::Database(e) => ApiError::Database(e.to_string()),
        }
    }
}

impl From<PasswordError> for ApiError {
    fn from(e: PasswordError) -> Self {
        ApiError::Internal(e.to_string())
    }
}

impl From<RefreshTokenError> for ApiError {
    fn from(e: RefreshTokenError) -> Self {
        AuthError::from(e).into()
    }
}

/// Unknown email and wrong password share one message
impl From<AuthError> for ApiError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::UserNotFound | AuthError::InvalidCredentials => {
                ApiError::Unauthorized("Incorrect email or password".into())
            }
            AuthError::Header(_) | AuthError::InvalidToken | AuthError::Unauthorized => {
                ApiError::unauthorized()
            }
            AuthError::Forbidden => ApiError::Forbidden,
            AuthError::Persistence(e) => e.into(),
            AuthError::Internal(msg) => ApiError::Internal(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::HeaderError;

    async fn body_of(err: ApiError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_client_errors_carry_their_message() {
        let (status, body) = body_of(ApiError::Validation("Chirp is too long".into())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "error": "Chirp is too long" }));
    }

    #[tokio::test]
    async fn test_server_errors_hide_the_cause() {
        let (status, body) = body_of(ApiError::Database("connection refused".into())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({ "error": "Something went wrong" }));
    }

    #[test]
    fn test_login_failures_are_indistinguishable() {
        let unknown = ApiError::from(AuthError::UserNotFound);
        let mismatch = ApiError::from(AuthError::InvalidCredentials);
        assert_eq!(unknown.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(unknown.to_string(), mismatch.to_string());
    }

    #[test]
    fn test_auth_error_mapping() {
        assert_eq!(
            ApiError::from(AuthError::Header(HeaderError::Missing)).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::from(AuthError::InvalidToken).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::from(AuthError::Forbidden).status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            ApiError::from(AuthError::Persistence(StoreError::UniqueViolation)).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError::from(RefreshTokenError::NotFound).status(),
            StatusCode::UNAUTHORIZED
        );
    }
}
