//! Chirp routes

use axum::{
    extract::{rejection::JsonRejection, Extension, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    auth::AuthUser,
    db::{Chirp, SortOrder},
    error::{ApiError, ApiResult},
    routes::json_body,
    state::AppState,
};

/// Longest accepted chirp, in characters
pub const MAX_CHIRP_LENGTH: usize = 140;

const PROFANE_WORDS: [&str; 3] = ["kerfuffle", "sharbert", "fornax"];
const CENSORED: &str = "****";

/// Replace profane words (split on single spaces) with `****`
///
/// Matching is case-insensitive and whole-word only, so `Sharbert!` is kept.
pub fn clean_body(body: &str) -> String {
    body.split(' ')
        .map(|word| {
            let lower = word.to_lowercase();
            if PROFANE_WORDS.contains(&lower.as_str()) {
                CENSORED
            } else {
                word
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[derive(Debug, Deserialize)]
pub struct CreateChirpRequest {
    #[serde(default)]
    pub body: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListChirpsQuery {
    pub author_id: Option<String>,
    pub sort: Option<String>,
}

fn parse_id(raw: &str, what: &str) -> ApiResult<Uuid> {
    Uuid::parse_str(raw.trim()).map_err(|_| ApiError::Validation(format!("Invalid {what}")))
}

fn parse_sort(raw: Option<&str>) -> ApiResult<SortOrder> {
    match raw.map(str::trim) {
        None | Some("") => Ok(SortOrder::Asc),
        Some(s) if s.eq_ignore_ascii_case("asc") => Ok(SortOrder::Asc),
        Some(s) if s.eq_ignore_ascii_case("desc") => Ok(SortOrder::Desc),
        Some(_) => Err(ApiError::Validation(
            "sort must be \"asc\" or \"desc\"".into(),
        )),
    }
}

pub async fn create_chirp(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    payload: Result<Json<CreateChirpRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Chirp>)> {
    let req = json_body(payload)?;
    if req.body.trim().is_empty() {
        return Err(ApiError::Validation("Chirp is empty".into()));
    }
    if req.body.chars().count() > MAX_CHIRP_LENGTH {
        return Err(ApiError::Validation("Chirp is too long".into()));
    }

    let chirp = state
        .chirps
        .create_chirp(auth_user.user_id, &clean_body(&req.body))
        .await?;

    tracing::info!(chirp_id = %chirp.id, user_id = %auth_user.user_id, "Chirp created");
    Ok((StatusCode::CREATED, Json(chirp)))
}

pub async fn list_chirps(
    State(state): State<AppState>,
    Query(query): Query<ListChirpsQuery>,
) -> ApiResult<Json<Vec<Chirp>>> {
    let author_id = match query.author_id.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => Some(parse_id(raw, "author_id")?),
    };
    let sort = parse_sort(query.sort.as_deref())?;

    Ok(Json(state.chirps.list_chirps(author_id, sort).await?))
}

pub async fn get_chirp(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Chirp>> {
    let id = parse_id(&id, "chirp ID")?;
    state
        .chirps
        .get_chirp(id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Chirp not found".into()))
}

/// Only the author may delete a chirp
pub async fn delete_chirp(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let id = parse_id(&id, "chirp ID")?;
    let chirp = state
        .chirps
        .get_chirp(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Chirp not found".into()))?;

    if chirp.user_id != auth_user.user_id {
        tracing::warn!(chirp_id = %id, user_id = %auth_user.user_id, "Delete refused: not the author");
        return Err(ApiError::Forbidden);
    }

    if !state.chirps.delete_chirp(id, auth_user.user_id).await? {
        return Err(ApiError::NotFound("Chirp not found".into()));
    }

    tracing::info!(chirp_id = %id, user_id = %auth_user.user_id, "Chirp deleted");
    Ok(StatusCode::NO_CONTENT)
}
