//! Refresh token lifecycle
//!
//! Refresh tokens are opaque 256-bit random values (64 hex chars) stored
//! server-side. A token is `Active` until it either passes `expires_at` or is
//! revoked; neither state can be left.

use std::sync::Arc;

use rand::rngs::OsRng;
use rand::TryRngCore;
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use crate::config::Platform;
use crate::db::{NewRefreshToken, RefreshToken, RefreshTokenRepository, StoreError};

/// Lifetime of a refresh token from creation
pub const REFRESH_TOKEN_TTL: Duration = Duration::days(60);

/// Random bytes per token
const TOKEN_BYTES: usize = 32;

#[derive(Debug, thiserror::Error)]
pub enum RefreshTokenError {
    #[error("refresh token not found")]
    NotFound,
    #[error("operation not permitted on platform {0:?}")]
    ForbiddenOperation(String),
    #[error("token generation failed: {0}")]
    Generation(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Generate a random token as 64 lowercase hex chars
pub fn generate_token() -> Result<String, RefreshTokenError> {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|e| RefreshTokenError::Generation(e.to_string()))?;
    Ok(hex::encode(bytes))
}

/// A token yields new access tokens only while unexpired and unrevoked
pub fn is_usable(record: &RefreshToken, now: OffsetDateTime) -> bool {
    now < record.expires_at && record.revoked_at.is_none()
}

#[derive(Clone)]
pub struct RefreshTokenStore {
    repo: Arc<dyn RefreshTokenRepository>,
    platform: Platform,
}

impl RefreshTokenStore {
    pub fn new(repo: Arc<dyn RefreshTokenRepository>, platform: Platform) -> Self {
        Self { repo, platform }
    }

    /// Issue and persist a fresh token for `user_id`
    pub async fn create(&self, user_id: Uuid) -> Result<RefreshToken, RefreshTokenError> {
        let now = OffsetDateTime::now_utc();
        let record = self
            .repo
            .insert_refresh_token(NewRefreshToken {
                token: generate_token()?,
                user_id,
                created_at: now,
                expires_at: now + REFRESH_TOKEN_TTL,
            })
            .await?;

        tracing::debug!(user_id = %user_id, expires_at = %record.expires_at, "Refresh token created");
        Ok(record)
    }

    /// Fetch a token record; `NotFound` if it was never issued
    pub async fn lookup(&self, token: &str) -> Result<RefreshToken, RefreshTokenError> {
        self.repo
            .get_refresh_token(token)
            .await?
            .ok_or(RefreshTokenError::NotFound)
    }

    /// Revoke a token. Already-revoked and unknown tokens return `Ok(false)`.
    pub async fn revoke(&self, token: &str) -> Result<bool, RefreshTokenError> {
        let revoked = self
            .repo
            .revoke_refresh_token(token, OffsetDateTime::now_utc())
            .await?;
        Ok(revoked)
    }

    /// Delete every user and, by cascade, every token. Dev platform only.
    pub async fn purge_all(&self) -> Result<u64, RefreshTokenError> {
        if !self.platform.is_dev() {
            return Err(RefreshTokenError::ForbiddenOperation(
                self.platform.as_str().to_string(),
            ));
        }
        let deleted = self.repo.delete_all_users().await?;
        tracing::warn!(users_deleted = deleted, "All users purged");
        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory::MemoryStore;
    use crate::db::UserRepository;

    fn store_on(platform: &str) -> (Arc<MemoryStore>, RefreshTokenStore) {
        let mem = Arc::new(MemoryStore::new());
        let store = RefreshTokenStore::new(mem.clone(), Platform::from(platform));
        (mem, store)
    }

    fn record(expires_at: OffsetDateTime, revoked_at: Option<OffsetDateTime>) -> RefreshToken {
        let now = OffsetDateTime::now_utc();
        RefreshToken {
            token: "t".repeat(64),
            created_at: now,
            updated_at: now,
            user_id: Uuid::new_v4(),
            expires_at,
            revoked_at,
        }
    }

    #[test]
    fn test_generated_tokens_are_64_hex_chars_and_unique() {
        let a = generate_token().unwrap();
        let b = generate_token().unwrap();
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        assert_ne!(a, b);
    }

    #[test]
    fn test_usability_boundaries() {
        let now = OffsetDateTime::now_utc();
        assert!(is_usable(&record(now + Duration::seconds(1), None), now));
        assert!(!is_usable(&record(now, None), now), "expires_at == now is expired");
        assert!(!is_usable(&record(now - Duration::seconds(1), None), now));
        assert!(!is_usable(&record(now + Duration::days(1), Some(now)), now));
    }

    #[tokio::test]
    async fn test_create_sets_sixty_day_lifetime() {
        let (_, store) = store_on("dev");
        let user_id = Uuid::new_v4();
        let record = store.create(user_id).await.unwrap();

        assert_eq!(record.user_id, user_id);
        assert_eq!(record.token.len(), 64);
        assert_eq!(record.expires_at - record.created_at, Duration::days(60));
        assert!(record.revoked_at.is_none());
        assert!(is_usable(&record, OffsetDateTime::now_utc()));
    }

    #[tokio::test]
    async fn test_lookup_unknown_token_is_not_found() {
        let (_, store) = store_on("dev");
        assert!(matches!(
            store.lookup("never-issued").await,
            Err(RefreshTokenError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_revoke_is_permanent_and_idempotent() {
        let (_, store) = store_on("dev");
        let record = store.create(Uuid::new_v4()).await.unwrap();

        assert!(store.revoke(&record.token).await.unwrap());
        let first = store.lookup(&record.token).await.unwrap();
        let revoked_at = first.revoked_at.expect("revoked_at set");
        assert!(!is_usable(&first, OffsetDateTime::now_utc()));

        // Second revoke changes nothing, including the timestamp
        assert!(!store.revoke(&record.token).await.unwrap());
        let second = store.lookup(&record.token).await.unwrap();
        assert_eq!(second.revoked_at, Some(revoked_at));
    }

    #[tokio::test]
    async fn test_revoke_unknown_token_is_not_an_error() {
        let (_, store) = store_on("dev");
        assert!(!store.revoke("never-issued").await.unwrap());
    }

    #[tokio::test]
    async fn test_purge_all_forbidden_outside_dev() {
        let (mem, store) = store_on("prod");
        mem.create_user("a@b.com", "hash").await.unwrap();

        assert!(matches!(
            store.purge_all().await,
            Err(RefreshTokenError::ForbiddenOperation(p)) if p == "prod"
        ));
        assert_eq!(mem.user_count(), 1);
    }

    #[tokio::test]
    async fn test_purge_all_cascades_to_tokens_on_dev() {
        let (mem, store) = store_on("dev");
        let user = mem.create_user("a@b.com", "hash").await.unwrap();
        let record = store.create(user.id).await.unwrap();

        assert_eq!(store.purge_all().await.unwrap(), 1);
        assert_eq!(mem.user_count(), 0);
        assert!(matches!(
            store.lookup(&record.token).await,
            Err(RefreshTokenError::NotFound)
        ));
    }
}
