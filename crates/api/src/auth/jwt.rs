//! Access token encoding and validation (HS256 JWT)
//!
//! Access tokens are stateless: nothing is persisted and they cannot be
//! revoked, so they stay short-lived. Lifetime policy (the one hour cap) is
//! applied by the caller, not here.

use std::time::Duration;

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

/// Issuer written into and required on every token
pub const ISSUER: &str = "chirpy";

#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    #[error("invalid token: {0}")]
    InvalidToken(String),
    #[error("token subject is not a valid user id")]
    SubjectParse,
    #[error("failed to sign token: {0}")]
    Signing(String),
}

/// Access token claims
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub iss: String,
    /// User id as a hyphenated UUID string
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
    /// Random per-token id; two tokens issued in the same second still differ
    pub jti: String,
}

impl Claims {
    pub fn new(subject: Uuid, issued_at: OffsetDateTime, ttl: Duration) -> Self {
        let iat = issued_at.unix_timestamp();
        Self {
            iss: ISSUER.to_string(),
            sub: subject.to_string(),
            iat,
            exp: iat.saturating_add(i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX)),
            jti: Uuid::new_v4().to_string(),
        }
    }
}

/// Signs and validates access tokens with a symmetric secret
#[derive(Clone)]
pub struct JwtManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl JwtManager {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    /// Issue a token for `subject` valid for `ttl` from now
    pub fn issue(&self, subject: Uuid, ttl: Duration) -> Result<String, JwtError> {
        self.encode_claims(&Claims::new(subject, OffsetDateTime::now_utc(), ttl))
    }

    /// Sign the given claims; identical claims produce identical tokens
    pub fn encode_claims(&self, claims: &Claims) -> Result<String, JwtError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .map_err(|e| JwtError::Signing(e.to_string()))
    }

    /// Validate a token and return its subject
    pub fn validate(&self, token: &str) -> Result<Uuid, JwtError> {
        let claims = self.decode_claims(token)?;
        Uuid::parse_str(&claims.sub).map_err(|_| JwtError::SubjectParse)
    }

    /// Validate a token and return all of its claims
    ///
    /// Only HMAC algorithms are accepted, so a token whose header names
    /// `none` or an asymmetric algorithm is rejected before any signature
    /// check. Expiry has no leeway: a token is dead once `exp <= now`.
    pub fn decode_claims(&self, token: &str) -> Result<Claims, JwtError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.algorithms = vec![Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];
        validation.leeway = 0;
        validation.set_issuer(&[ISSUER]);
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);

        let data = decode::<Claims>(token, &self.decoding_key, &validation)
            .map_err(|e| JwtError::InvalidToken(e.to_string()))?;

        // jsonwebtoken treats exp == now as still valid
        if data.claims.exp <= OffsetDateTime::now_utc().unix_timestamp() {
            return Err(JwtError::InvalidToken("token expired".to_string()));
        }

        Ok(data.claims)
    }
}
