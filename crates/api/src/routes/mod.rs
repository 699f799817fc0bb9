//! HTTP routes

pub mod admin;
pub mod chirps;
pub mod tokens;
pub mod users;
pub mod webhooks;


use axum::{
    extract::rejection::JsonRejection,
    middleware,
    routing::{get, post, put},
    Json, Router,
};
use tower_http::services::ServeDir;

use crate::{
    auth::require_auth,
    error::{ApiError, ApiResult},
    metrics::count_hits,
    state::AppState,
};

/// Build the full application router
pub fn create_router(state: AppState) -> Router {
    let auth = || middleware::from_fn_with_state(state.clone(), require_auth);

    let api = Router::new()
        .route("/api/healthz", get(healthz))
        .route(
            "/api/users",
            post(users::create_user).merge(put(users::update_user).route_layer(auth())),
        )
        .route("/api/login", post(users::login))
        .route("/api/refresh", post(tokens::refresh))
        .route("/api/revoke", post(tokens::revoke))
        .route(
            "/api/chirps",
            get(chirps::list_chirps).merge(post(chirps::create_chirp).route_layer(auth())),
        )
        .route(
            "/api/chirps/{id}",
            get(chirps::get_chirp)
                .merge(axum::routing::delete(chirps::delete_chirp).route_layer(auth())),
        )
        .route("/api/polka/webhooks", post(webhooks::polka_webhook))
        .route("/admin/metrics", get(admin::metrics))
        .route("/admin/reset", post(admin::reset));

    let file_server = Router::new()
        .nest_service("/app", ServeDir::new(&state.config.fileserver_root))
        .layer(middleware::from_fn_with_state(
            state.metrics.clone(),
            count_hits,
        ));

    api.merge(file_server).with_state(state)
}

async fn healthz() -> &'static str {
    "OK"
}

/// Unwrap a JSON body, turning extractor rejections into 400s
pub(crate) fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> ApiResult<T> {
    match payload {
        Ok(Json(value)) => Ok(value),
        Err(rejection) => {
            tracing::debug!(error = %rejection, "Rejected request body");
            Err(ApiError::Validation("Invalid request body".to_string()))
        }
    }
}
