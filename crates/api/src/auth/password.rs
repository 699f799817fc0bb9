//! Password hashing with Argon2id
//!
//! Hashes are PHC strings (`$argon2id$v=19$m=19456,t=2,p=1$<salt>$<hash>`) that
//! carry their own salt and cost parameters, so verification needs nothing but
//! the stored string.

use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::rngs::OsRng;
use rand::TryRngCore;

/// Salt length in bytes (128 bits)
const SALT_LEN: usize = 16;

#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    #[error("password hashing failed: {0}")]
    Hashing(String),
    #[error("password does not match")]
    Mismatch,
    #[error("stored password hash is malformed")]
    MalformedHash,
}

/// Argon2id with the crate's default cost (m=19456 KiB, t=2, p=1).
/// Changing these only affects new hashes; old ones keep their parameters.
fn hasher() -> Argon2<'static> {
    Argon2::default()
}

/// Hash a plaintext password with a fresh random salt
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let mut salt_bytes = [0u8; SALT_LEN];
    OsRng
        .try_fill_bytes(&mut salt_bytes)
        .map_err(|e| PasswordError::Hashing(format!("salt generation failed: {e}")))?;
    let salt = SaltString::encode_b64(&salt_bytes)
        .map_err(|e| PasswordError::Hashing(e.to_string()))?;

    let hash = hasher()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| PasswordError::Hashing(e.to_string()))?;

    Ok(hash.to_string())
}

/// Verify a plaintext password against a stored hash
///
/// A wrong password is [`PasswordError::Mismatch`]; any other error means the
/// stored hash is unusable.
pub fn verify_password(password: &str, hash: &str) -> Result<(), PasswordError> {
    let parsed = PasswordHash::new(hash).map_err(|_| PasswordError::MalformedHash)?;

    hasher()
        .verify_password(password.as_bytes(), &parsed)
        .map_err(|e| match e {
            argon2::password_hash::Error::Password => PasswordError::Mismatch,
            _ => PasswordError::MalformedHash,
        })
}

/// Hash of a random secret nobody knows
///
/// Login verifies against this when the email is unknown so both branches
/// cost one Argon2 computation.
pub fn generate_impossible_hash() -> Result<String, PasswordError> {
    let mut secret = [0u8; 32];
    OsRng
        .try_fill_bytes(&mut secret)
        .map_err(|e| PasswordError::Hashing(format!("secret generation failed: {e}")))?;
    hash_password(&hex::encode(secret))
}

/// Run [`hash_password`] on the blocking pool
pub async fn hash_password_blocking(password: String) -> Result<String, PasswordError> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| PasswordError::Hashing(format!("hashing task failed: {e}")))?
}

/// Run [`verify_password`] on the blocking pool
pub async fn verify_password_blocking(password: String, hash: String) -> Result<(), PasswordError> {
    tokio::task::spawn_blocking(move || verify_password(&password, &hash))
        .await
        .map_err(|e| PasswordError::Hashing(format!("verification task failed: {e}")))?
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_then_verify_succeeds() {
        let hash = hash_password("thisisatestpassword").unwrap();
        assert!(verify_password("thisisatestpassword", &hash).is_ok());
    }

    #[test]
    fn test_wrong_password_is_mismatch() {
        let hash = hash_password("pw123").unwrap();
        let result = verify_password("pw124", &hash);
        assert!(matches!(result, Err(PasswordError::Mismatch)));
    }

    #[test]
    fn test_hash_embeds_algorithm_and_params() {
        let hash = hash_password("pw123").unwrap();
        assert!(hash.starts_with("$argon2id$v=19$m=19456,t=2,p=1$"));
        assert!(!hash.contains("pw123"));
    }

    #[test]
    fn test_same_password_gets_distinct_salts() {
        let a = hash_password("same").unwrap();
        let b = hash_password("same").unwrap();
        assert_ne!(a, b);
        assert!(verify_password("same", &a).is_ok());
        assert!(verify_password("same", &b).is_ok());
    }

    #[test]
    fn test_empty_password_round_trips() {
        // Route handlers reject empty passwords; the hasher itself does not
        let hash = hash_password("").unwrap();
        assert!(verify_password("", &hash).is_ok());
        assert!(matches!(
            verify_password(" ", &hash),
            Err(PasswordError::Mismatch)
        ));
    }

    #[test]
    fn test_malformed_hash_is_not_a_mismatch() {
        assert!(matches!(
            verify_password("pw", "not-a-phc-string"),
            Err(PasswordError::MalformedHash)
        ));
        assert!(matches!(
            verify_password("pw", ""),
            Err(PasswordError::MalformedHash)
        ));
    }

    #[test]
    fn test_impossible_hash_rejects_common_inputs() {
        let hash = generate_impossible_hash().unwrap();
        for guess in ["", "password", "pw123", "admin"] {
            assert!(matches!(
                verify_password(guess, &hash),
                Err(PasswordError::Mismatch)
            ));
        }
    }

    #[tokio::test]
    async fn test_blocking_wrappers_agree_with_sync_versions() {
        let hash = hash_password_blocking("pw123".to_string()).await.unwrap();
        assert!(verify_password_blocking("pw123".to_string(), hash.clone())
            .await
            .is_ok());
        assert!(matches!(
            verify_password_blocking("nope".to_string(), hash).await,
            Err(PasswordError::Mismatch)
        ));
    }
}
