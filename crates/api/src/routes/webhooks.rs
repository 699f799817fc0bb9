//! Polka payment webhooks

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use serde::Deserialize;
use subtle::ConstantTimeEq;
use uuid::Uuid;

use crate::{
    auth::extract_api_key,
    error::{ApiError, ApiResult},
    routes::json_body,
    state::AppState,
};

/// The only event Polka sends that we act on
pub const USER_UPGRADED: &str = "user.upgraded";

#[derive(Debug, Deserialize)]
pub struct PolkaWebhook {
    pub event: String,
    #[serde(default)]
    pub data: PolkaWebhookData,
}

#[derive(Debug, Default, Deserialize)]
pub struct PolkaWebhookData {
    #[serde(default)]
    pub user_id: String,
}

/// An unset key matches nothing
fn key_matches(presented: &str, expected: &str) -> bool {
    !expected.is_empty() && bool::from(presented.as_bytes().ct_eq(expected.as_bytes()))
}

pub async fn polka_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<PolkaWebhook>, JsonRejection>,
) -> ApiResult<StatusCode> {
    let key = extract_api_key(&headers).map_err(|e| {
        tracing::warn!(error = %e, "Polka webhook without usable API key");
        ApiError::unauthorized()
    })?;
    if !key_matches(&key, &state.config.polka_key) {
        tracing::warn!("Polka webhook with wrong API key");
        return Err(ApiError::unauthorized());
    }

    let webhook = json_body(payload)?;
    if webhook.event != USER_UPGRADED {
        tracing::debug!(event = %webhook.event, "Ignoring Polka event");
        return Ok(StatusCode::NO_CONTENT);
    }

    let user_id = Uuid::parse_str(webhook.data.user_id.trim())
        .map_err(|_| ApiError::Validation("Invalid user_id".into()))?;
    if !state.users.upgrade_user(user_id).await? {
        return Err(ApiError::NotFound("User not found".into()));
    }

    tracing::info!(user_id = %user_id, "User upgraded to Chirpy Red");
    Ok(StatusCode::NO_CONTENT)
}
