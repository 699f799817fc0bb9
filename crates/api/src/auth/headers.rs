//! `Authorization` header parsing

use axum::http::{header::AUTHORIZATION, HeaderMap};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HeaderError {
    #[error("authorization header not found")]
    Missing,
    #[error("authorization header is malformed")]
    Malformed,
}

/// Extract the token from `Authorization: Bearer <token>`
pub fn extract_bearer(headers: &HeaderMap) -> Result<String, HeaderError> {
    extract_credential(headers, "bearer")
}

/// Extract the key from `Authorization: ApiKey <key>`
pub fn extract_api_key(headers: &HeaderMap) -> Result<String, HeaderError> {
    extract_credential(headers, "apikey")
}

/// Split `<scheme> <value>` and check the scheme case-insensitively
fn extract_credential(headers: &HeaderMap, scheme: &str) -> Result<String, HeaderError> {
    let raw = headers.get(AUTHORIZATION).ok_or(HeaderError::Missing)?;
    let value = raw.to_str().map_err(|_| HeaderError::Malformed)?.trim();
    if value.is_empty() {
        return Err(HeaderError::Missing);
    }

    let mut parts = value.split_whitespace();
    let (Some(given_scheme), Some(credential), None) = (parts.next(), parts.next(), parts.next())
    else {
        return Err(HeaderError::Malformed);
    };

    if !given_scheme.eq_ignore_ascii_case(scheme) {
        return Err(HeaderError::Malformed);
    }

    Ok(credential.to_string())
}
