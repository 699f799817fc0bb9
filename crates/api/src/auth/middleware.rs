//! Authentication middleware for Axum

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use uuid::Uuid;

use crate::{error::ApiError, state::AppState};

/// Authenticated user extracted from a bearer access token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser {
    pub user_id: Uuid,
}

/// Middleware that requires a valid access token
///
/// On success the [`AuthUser`] is available to handlers as an `Extension`.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();

    match state.auth.authenticate(request.headers()).await {
        Ok(user_id) => {
            tracing::debug!(path = %path, user_id = %user_id, "require_auth: authentication successful");
            request.extensions_mut().insert(AuthUser { user_id });
            next.run(request).await
        }
        Err(err) => {
            tracing::warn!(path = %path, error = %err, "require_auth: authentication failed");
            ApiError::from(err).into_response()
        }
    }
}
