//! Admin routes: file server metrics and the dev-only reset

use axum::{extract::State, response::Html};

use crate::{
    auth::RefreshTokenError,
    error::{ApiError, ApiResult},
    state::AppState,
};

pub async fn metrics(State(state): State<AppState>) -> Html<String> {
    Html(format!(
        "<html>\n  <body>\n    <h1>Welcome, Chirpy Admin</h1>\n    <p>Chirpy has been visited {} times!</p>\n  </body>\n</html>",
        state.metrics.hits()
    ))
}

/// Wipe all users and zero the hit counter. Dev platform only.
///
/// A storage failure is logged and the counter is still reset.
pub async fn reset(State(state): State<AppState>) -> ApiResult<&'static str> {
    match state.auth.refresh_tokens().purge_all().await {
        Ok(_) => {}
        Err(RefreshTokenError::ForbiddenOperation(platform)) => {
            tracing::warn!(platform = %platform, "Reset refused outside the dev platform");
            return Err(ApiError::Forbidden);
        }
        Err(e) => tracing::error!(error = %e, "Reset failed to remove users"),
    }
    state.metrics.reset();
    Ok("Hits reset to 0")
}
