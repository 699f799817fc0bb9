//! Persistence layer
//!
//! Row types and the repository traits the auth core and route handlers
//! depend on. [`PgStore`] is the production implementation; tests use the
//! in-memory store.

#[cfg(test)]
pub(crate) mod memory;
pub mod postgres;

use async_trait::async_trait;
use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

pub use postgres::PgStore;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("unique constraint violated")]
    UniqueViolation,
    #[error("database error: {0}")]
    Database(#[source] sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        let unique = e
            .as_database_error()
            .is_some_and(|db| db.is_unique_violation());
        if unique {
            StoreError::UniqueViolation
        } else {
            StoreError::Database(e)
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// User row. Not `Serialize`; responses go through `UserResponse` so the
/// password hash never leaves the server.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
    pub email: String,
    pub hashed_password: String,
    pub is_chirpy_red: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct Chirp {
    pub id: Uuid,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
    pub body: String,
    pub user_id: Uuid,
}

/// Persisted refresh token record
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct RefreshToken {
    pub token: String,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
    pub user_id: Uuid,
    pub expires_at: OffsetDateTime,
    pub revoked_at: Option<OffsetDateTime>,
}

/// Parameters for inserting a refresh token
#[derive(Debug, Clone)]
pub struct NewRefreshToken {
    pub token: String,
    pub user_id: Uuid,
    pub created_at: OffsetDateTime,
    pub expires_at: OffsetDateTime,
}

/// Creation-time ordering for chirp listings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create_user(&self, email: &str, hashed_password: &str) -> StoreResult<User>;

    async fn get_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    /// Replace email and password hash; `None` if the user no longer exists
    async fn update_credentials(
        &self,
        id: Uuid,
        email: &str,
        hashed_password: &str,
    ) -> StoreResult<Option<User>>;

    /// Set `is_chirpy_red`; returns false when no such user exists
    async fn upgrade_user(&self, id: Uuid) -> StoreResult<bool>;
}

#[async_trait]
pub trait ChirpRepository: Send + Sync {
    async fn create_chirp(&self, user_id: Uuid, body: &str) -> StoreResult<Chirp>;

    async fn list_chirps(&self, author_id: Option<Uuid>, sort: SortOrder)
        -> StoreResult<Vec<Chirp>>;

    async fn get_chirp(&self, id: Uuid) -> StoreResult<Option<Chirp>>;

    /// Delete a chirp owned by `user_id`; returns false when nothing matched
    async fn delete_chirp(&self, id: Uuid, user_id: Uuid) -> StoreResult<bool>;
}

#[async_trait]
pub trait RefreshTokenRepository: Send + Sync {
    async fn insert_refresh_token(&self, params: NewRefreshToken) -> StoreResult<RefreshToken>;

    async fn get_refresh_token(&self, token: &str) -> StoreResult<Option<RefreshToken>>;

    /// Mark as revoked unless already revoked; returns whether a row changed
    async fn revoke_refresh_token(&self, token: &str, at: OffsetDateTime) -> StoreResult<bool>;

    /// Delete every user. Refresh tokens and chirps go with them via cascade.
    async fn delete_all_users(&self) -> StoreResult<u64>;
}
