//! Authentication module for Chirpy

pub mod gateway;
pub mod headers;
pub mod jwt;
pub mod middleware;
pub mod password;
pub mod refresh_tokens;

pub use gateway::{
    access_token_ttl, AuthError, AuthGateway, Credential, Identity, LoginSession,
    MAX_ACCESS_TOKEN_TTL,
};
pub use headers::{extract_api_key, extract_bearer, HeaderError};
pub use jwt::{Claims, JwtError, JwtManager};
pub use middleware::{require_auth, AuthUser};
pub use password::{
    generate_impossible_hash, hash_password, hash_password_blocking, verify_password,
    verify_password_blocking, PasswordError,
};
pub use refresh_tokens::{RefreshTokenError, RefreshTokenStore, REFRESH_TOKEN_TTL};
