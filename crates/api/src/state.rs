//! Application state

use std::sync::Arc;

use sqlx::PgPool;

use crate::{
    auth::{AuthGateway, JwtManager, RefreshTokenStore},
    config::Config,
    db::{ChirpRepository, PgStore, RefreshTokenRepository, UserRepository},
    metrics::RequestMetrics,
};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub users: Arc<dyn UserRepository>,
    pub chirps: Arc<dyn ChirpRepository>,
    pub auth: AuthGateway,
    /// Hits served by the `/app` file server
    pub metrics: RequestMetrics,
}

impl AppState {
    pub fn new(pool: PgPool, config: Config) -> Self {
        Self::with_store(config, Arc::new(PgStore::new(pool)))
    }

    /// Build state over any store implementing all three repositories
    pub fn with_store<S>(config: Config, store: Arc<S>) -> Self
    where
        S: UserRepository + ChirpRepository + RefreshTokenRepository + 'static,
    {
        if config.platform.is_dev() {
            tracing::warn!("Running on the dev platform: /admin/reset is enabled");
        }
        if config.polka_key.is_empty() {
            tracing::warn!("POLKA_KEY not set: every Polka webhook will be rejected");
        }

        let refresh_tokens = RefreshTokenStore::new(store.clone(), config.platform.clone());
        let auth = AuthGateway::new(
            store.clone(),
            refresh_tokens,
            JwtManager::new(&config.jwt_secret),
        );

        Self {
            config: Arc::new(config),
            users: store.clone(),
            chirps: store,
            auth,
            metrics: RequestMetrics::new(),
        }
    }
}
