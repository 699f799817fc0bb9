//! In-memory store for unit and router tests

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use super::{
    Chirp, ChirpRepository, NewRefreshToken, RefreshToken, RefreshTokenRepository, SortOrder,
    StoreError, StoreResult, User, UserRepository,
};

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    chirps: Vec<Chirp>,
    refresh_tokens: HashMap<String, RefreshToken>,
}

/// Mirrors the Postgres schema semantics: unique emails, unique token keys,
/// cascade deletes from users.
#[derive(Default)]
pub(crate) struct MemoryStore {
    tables: Mutex<Tables>,
    fail_token_writes: AtomicBool,
}

impl MemoryStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Make every refresh token insert fail with a database error
    pub(crate) fn fail_token_writes(&self) {
        self.fail_token_writes.store(true, Ordering::SeqCst);
    }

    pub(crate) fn user_count(&self) -> usize {
        self.tables.lock().unwrap().users.len()
    }

    pub(crate) fn refresh_token_count(&self) -> usize {
        self.tables.lock().unwrap().refresh_tokens.len()
    }

    /// Insert a token record verbatim, bypassing expiry computation
    pub(crate) fn put_refresh_token(&self, record: RefreshToken) {
        self.tables
            .lock()
            .unwrap()
            .refresh_tokens
            .insert(record.token.clone(), record);
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn create_user(&self, email: &str, hashed_password: &str) -> StoreResult<User> {
        let mut tables = self.tables.lock().unwrap();
        if tables.users.values().any(|u| u.email == email) {
            return Err(StoreError::UniqueViolation);
        }
        let now = OffsetDateTime::now_utc();
        let user = User {
            id: Uuid::new_v4(),
            created_at: now,
            updated_at: now,
            email: email.to_string(),
            hashed_password: hashed_password.to_string(),
            is_chirpy_red: false,
        };
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn get_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let tables = self.tables.lock().unwrap();
        Ok(tables.users.values().find(|u| u.email == email).cloned())
    }

    async fn update_credentials(
        &self,
        id: Uuid,
        email: &str,
        hashed_password: &str,
    ) -> StoreResult<Option<User>> {
        let mut tables = self.tables.lock().unwrap();
        if tables.users.values().any(|u| u.email == email && u.id != id) {
            return Err(StoreError::UniqueViolation);
        }
        Ok(tables.users.get_mut(&id).map(|user| {
            user.email = email.to_string();
            user.hashed_password = hashed_password.to_string();
            user.updated_at = OffsetDateTime::now_utc();
            user.clone()
        }))
    }

    async fn upgrade_user(&self, id: Uuid) -> StoreResult<bool> {
        let mut tables = self.tables.lock().unwrap();
        Ok(tables
            .users
            .get_mut(&id)
            .map(|user| user.is_chirpy_red = true)
            .is_some())
    }
}

#[async_trait]
impl ChirpRepository for MemoryStore {
    async fn create_chirp(&self, user_id: Uuid, body: &str) -> StoreResult<Chirp> {
        let mut tables = self.tables.lock().unwrap();
        let now = OffsetDateTime::now_utc();
        let chirp = Chirp {
            id: Uuid::new_v4(),
            created_at: now,
            updated_at: now,
            body: body.to_string(),
            user_id,
        };
        tables.chirps.push(chirp.clone());
        Ok(chirp)
    }

    async fn list_chirps(
        &self,
        author_id: Option<Uuid>,
        sort: SortOrder,
    ) -> StoreResult<Vec<Chirp>> {
        let tables = self.tables.lock().unwrap();
        let mut chirps: Vec<Chirp> = tables
            .chirps
            .iter()
            .filter(|c| author_id.is_none_or(|id| c.user_id == id))
            .cloned()
            .collect();
        // Insertion order breaks ties between equal timestamps
        if sort == SortOrder::Desc {
            chirps.reverse();
        }
        Ok(chirps)
    }

    async fn get_chirp(&self, id: Uuid) -> StoreResult<Option<Chirp>> {
        let tables = self.tables.lock().unwrap();
        Ok(tables.chirps.iter().find(|c| c.id == id).cloned())
    }

    async fn delete_chirp(&self, id: Uuid, user_id: Uuid) -> StoreResult<bool> {
        let mut tables = self.tables.lock().unwrap();
        let before = tables.chirps.len();
        tables
            .chirps
            .retain(|c| !(c.id == id && c.user_id == user_id));
        Ok(tables.chirps.len() < before)
    }
}

#[async_trait]
impl RefreshTokenRepository for MemoryStore {
    async fn insert_refresh_token(&self, params: NewRefreshToken) -> StoreResult<RefreshToken> {
        if self.fail_token_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Database(sqlx::Error::PoolTimedOut));
        }
        let mut tables = self.tables.lock().unwrap();
        if tables.refresh_tokens.contains_key(&params.token) {
            return Err(StoreError::UniqueViolation);
        }
        let record = RefreshToken {
            token: params.token,
            created_at: params.created_at,
            updated_at: params.created_at,
            user_id: params.user_id,
            expires_at: params.expires_at,
            revoked_at: None,
        };
        tables
            .refresh_tokens
            .insert(record.token.clone(), record.clone());
        Ok(record)
    }

    async fn get_refresh_token(&self, token: &str) -> StoreResult<Option<RefreshToken>> {
        let tables = self.tables.lock().unwrap();
        Ok(tables.refresh_tokens.get(token).cloned())
    }

    async fn revoke_refresh_token(&self, token: &str, at: OffsetDateTime) -> StoreResult<bool> {
        let mut tables = self.tables.lock().unwrap();
        match tables.refresh_tokens.get_mut(token) {
            Some(record) if record.revoked_at.is_none() => {
                record.revoked_at = Some(at);
                record.updated_at = at;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn delete_all_users(&self) -> StoreResult<u64> {
        let mut tables = self.tables.lock().unwrap();
        let deleted = tables.users.len() as u64;
        tables.users.clear();
        tables.chirps.clear();
        tables.refresh_tokens.clear();
        Ok(deleted)
    }
}
