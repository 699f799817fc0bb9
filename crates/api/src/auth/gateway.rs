//! Authentication gateway used by route handlers
//!
//! Two credential kinds reach the gateway:
//! - access tokens, verified statelessly by MAC and expiry
//! - refresh tokens, verified by a store lookup against expiry and revocation
//!
//! They fail and revoke differently, so [`Credential`] keeps them distinct
//! behind the single [`AuthGateway::verify`] entry point.

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use axum::http::HeaderMap;
use time::OffsetDateTime;
use uuid::Uuid;

use super::headers::{extract_bearer, HeaderError};
use super::jwt::{JwtError, JwtManager};
use super::password::{generate_impossible_hash, verify_password_blocking, PasswordError};
use super::refresh_tokens::{is_usable, RefreshTokenError, RefreshTokenStore};
use crate::db::{RefreshToken, StoreError, User, UserRepository};

/// Longest lifetime an access token may be issued with
pub const MAX_ACCESS_TOKEN_TTL: Duration = Duration::from_secs(60 * 60);

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error(transparent)]
    Header(#[from] HeaderError),
    #[error("no user with that email")]
    UserNotFound,
    #[error("password does not match")]
    InvalidCredentials,
    #[error("refresh token is unknown, expired or revoked")]
    InvalidToken,
    #[error("unauthorized")]
    Unauthorized,
    #[error("forbidden")]
    Forbidden,
    #[error("persistence failure: {0}")]
    Persistence(#[from] StoreError),
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<RefreshTokenError> for AuthError {
    fn from(e: RefreshTokenError) -> Self {
        match e {
            RefreshTokenError::NotFound => AuthError::InvalidToken,
            RefreshTokenError::ForbiddenOperation(_) => AuthError::Forbidden,
            RefreshTokenError::Generation(msg) => AuthError::Internal(msg),
            RefreshTokenError::Store(e) => AuthError::Persistence(e),
        }
    }
}

impl From<PasswordError> for AuthError {
    fn from(e: PasswordError) -> Self {
        match e {
            PasswordError::Mismatch => AuthError::InvalidCredentials,
            other => AuthError::Internal(other.to_string()),
        }
    }
}

/// A credential presented by a client
#[derive(Debug, Clone)]
pub enum Credential {
    /// Signed JWT, checked without touching the database
    AccessToken(String),
    /// Opaque token checked against the refresh token table
    RefreshToken(String),
}

/// Who a verified credential belongs to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identity {
    Stateless { user_id: Uuid },
    Stateful { user_id: Uuid, token: RefreshToken },
}

impl Identity {
    pub fn user_id(&self) -> Uuid {
        match self {
            Identity::Stateless { user_id } | Identity::Stateful { user_id, .. } => *user_id,
        }
    }
}

/// Result of a successful login
#[derive(Debug, Clone)]
pub struct LoginSession {
    pub user: User,
    pub access_token: String,
    pub refresh_token: RefreshToken,
}

/// Clamp a requested access token lifetime to `(0, 1h]`, defaulting to 1h
pub fn access_token_ttl(requested_secs: Option<u64>) -> Duration {
    match requested_secs {
        Some(secs) if secs > 0 => Duration::from_secs(secs).min(MAX_ACCESS_TOKEN_TTL),
        _ => MAX_ACCESS_TOKEN_TTL,
    }
}

#[derive(Clone)]
pub struct AuthGateway {
    users: Arc<dyn UserRepository>,
    refresh_tokens: RefreshTokenStore,
    jwt: JwtManager,
}

impl AuthGateway {
    pub fn new(
        users: Arc<dyn UserRepository>,
        refresh_tokens: RefreshTokenStore,
        jwt: JwtManager,
    ) -> Self {
        Self {
            users,
            refresh_tokens,
            jwt,
        }
    }

    pub fn refresh_tokens(&self) -> &RefreshTokenStore {
        &self.refresh_tokens
    }

    /// Verify either kind of credential
    pub async fn verify(&self, credential: Credential) -> Result<Identity, AuthError> {
        match credential {
            Credential::AccessToken(token) => {
                let user_id = self.jwt.validate(&token).map_err(|e| {
                    tracing::debug!(error = %e, "Access token rejected");
                    match e {
                        JwtError::Signing(msg) => AuthError::Internal(msg),
                        JwtError::InvalidToken(_) | JwtError::SubjectParse => {
                            AuthError::Unauthorized
                        }
                    }
                })?;
                Ok(Identity::Stateless { user_id })
            }
            Credential::RefreshToken(token) => {
                let record = self.refresh_tokens.lookup(&token).await?;
                if !is_usable(&record, OffsetDateTime::now_utc()) {
                    tracing::info!(
                        user_id = %record.user_id,
                        revoked = record.revoked_at.is_some(),
                        "Refresh token expired or revoked"
                    );
                    return Err(AuthError::InvalidToken);
                }
                Ok(Identity::Stateful {
                    user_id: record.user_id,
                    token: record,
                })
            }
        }
    }

    /// Authenticate a request by its bearer access token
    ///
    /// Every failure (missing header, bad signature, expiry) collapses to
    /// [`AuthError::Unauthorized`]; the cause is only logged.
    pub async fn authenticate(&self, headers: &HeaderMap) -> Result<Uuid, AuthError> {
        let token = extract_bearer(headers).map_err(|e| {
            tracing::debug!(error = %e, "No usable bearer token");
            AuthError::Unauthorized
        })?;
        match self.verify(Credential::AccessToken(token)).await {
            Ok(identity) => Ok(identity.user_id()),
            Err(AuthError::Internal(msg)) => Err(AuthError::Internal(msg)),
            Err(_) => Err(AuthError::Unauthorized),
        }
    }

    /// Check email and password, then issue an access and a refresh token
    ///
    /// An unknown email and a wrong password both cost one Argon2
    /// verification and surface as 401s with the same body.
    pub async fn login(
        &self,
        email: &str,
        password: &str,
        requested_ttl_secs: Option<u64>,
    ) -> Result<LoginSession, AuthError> {
        let Some(user) = self.users.get_user_by_email(email).await? else {
            match dummy_hash() {
                Some(hash) => {
                    let _ = verify_password_blocking(password.to_string(), hash).await;
                }
                None => tracing::warn!("Dummy password hash unavailable for timing equalization"),
            }
            return Err(AuthError::UserNotFound);
        };

        verify_password_blocking(password.to_string(), user.hashed_password.clone())
            .await
            .map_err(|e| match e {
                PasswordError::Mismatch => {
                    tracing::info!(user_id = %user.id, "Login rejected: password mismatch");
                    AuthError::InvalidCredentials
                }
                other => {
                    tracing::error!(user_id = %user.id, error = %other, "Stored password hash unusable");
                    AuthError::from(other)
                }
            })?;

        // Persist the refresh token first so a failure leaves nothing issued
        let refresh_token = self.refresh_tokens.create(user.id).await?;
        let access_token = self
            .jwt
            .issue(user.id, access_token_ttl(requested_ttl_secs))
            .map_err(|e| AuthError::Internal(e.to_string()))?;

        tracing::info!(user_id = %user.id, "User logged in");
        Ok(LoginSession {
            user,
            access_token,
            refresh_token,
        })
    }

    /// Mint a new one-hour access token from a usable refresh token
    ///
    /// The refresh token itself is not rotated and stays valid.
    pub async fn refresh(&self, refresh_token: &str) -> Result<String, AuthError> {
        let identity = self
            .verify(Credential::RefreshToken(refresh_token.to_string()))
            .await?;
        self.jwt
            .issue(identity.user_id(), MAX_ACCESS_TOKEN_TTL)
            .map_err(|e| AuthError::Internal(e.to_string()))
    }

    /// Revoke a refresh token. Never fails from the caller's point of view.
    pub async fn revoke(&self, refresh_token: &str) {
        match self.refresh_tokens.revoke(refresh_token).await {
            Ok(true) => tracing::info!("Refresh token revoked"),
            Ok(false) => tracing::info!("Revoke requested for unknown or already revoked token"),
            Err(e) => tracing::error!(error = %e, "Failed to revoke refresh token"),
        }
    }
}

/// Process-wide hash used to equalize login timing for unknown emails
fn dummy_hash() -> Option<String> {
    static HASH: OnceLock<Option<String>> = OnceLock::new();
    HASH.get_or_init(|| generate_impossible_hash().ok())
        .clone()
}
