//! Refresh and revoke endpoints
//!
//! Both take the refresh token as `Authorization: Bearer <token>`.

use axum::{extract::State, http::HeaderMap, http::StatusCode, Json};
use serde::Serialize;

use crate::{
    auth::extract_bearer,
    error::{ApiError, ApiResult},
    state::AppState,
};

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
}

pub async fn refresh(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<TokenResponse>> {
    let refresh_token = extract_bearer(&headers).map_err(|e| {
        tracing::debug!(error = %e, "Refresh without usable bearer token");
        ApiError::unauthorized()
    })?;

    let token = state.auth.refresh(&refresh_token).await?;
    Ok(Json(TokenResponse { token }))
}

/// Always answers 204, whatever happened to the token
pub async fn revoke(State(state): State<AppState>, headers: HeaderMap) -> StatusCode {
    match extract_bearer(&headers) {
        Ok(token) => state.auth.revoke(&token).await,
        Err(e) => tracing::debug!(error = %e, "Revoke without usable bearer token"),
    }
    StatusCode::NO_CONTENT
}
