//! Bearer credential extraction from request headers
//!
//! The same parsing rule serves both token kinds. Access tokens travel in
//! `Authorization`, refresh tokens in `X-Refresh-Token`.

use actix_web::http::header::{HeaderMap, AUTHORIZATION};
use thiserror::Error;

pub const BEARER_PREFIX: &str = "Bearer ";
pub const REFRESH_TOKEN_HEADER: &str = "X-Refresh-Token";

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum BearerError {
    #[error("no bearer credential supplied")]
    Missing,
    #[error("credential is not of the form `Bearer <token>`")]
    Malformed,
}

/// Parse `Bearer <token>` out of a raw header value
pub fn extract_bearer(header_value: Option<&str>) -> Result<String, BearerError> {
    let value = match header_value {
        Some(value) if !value.is_empty() => value,
        _ => return Err(BearerError::Missing),
    };

    let token = value
        .strip_prefix(BEARER_PREFIX)
        .ok_or(BearerError::Malformed)?;

    if token.is_empty() || token.contains(BEARER_PREFIX) {
        return Err(BearerError::Malformed);
    }

    Ok(token.to_string())
}

fn extract_from(headers: &HeaderMap, name: &str) -> Result<String, BearerError> {
    match headers.get(name) {
        None => Err(BearerError::Missing),
        Some(value) => {
            let value = value.to_str().map_err(|_| BearerError::Malformed)?;
            extract_bearer(Some(value))
        }
    }
}

/// Access token from the `Authorization` header
pub fn get_bearer_token(headers: &HeaderMap) -> Result<String, BearerError> {
    extract_from(headers, AUTHORIZATION.as_str())
}

/// Refresh token from the `X-Refresh-Token` header
pub fn get_refresh_token(headers: &HeaderMap) -> Result<String, BearerError> {
    extract_from(headers, REFRESH_TOKEN_HEADER)
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::header::{HeaderName, HeaderValue};

    fn headers_with(name: &str, value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            HeaderName::from_bytes(name.as_bytes()).unwrap(),
            HeaderValue::from_str(value).unwrap(),
        );
        headers
    }

    #[test]
    fn test_extracts_token() {
        assert_eq!(extract_bearer(Some("Bearer abc123")).unwrap(), "abc123");
    }

    #[test]
    fn test_missing_header() {
        assert_eq!(extract_bearer(None), Err(BearerError::Missing));
        assert_eq!(extract_bearer(Some("")), Err(BearerError::Missing));
    }

    #[test]
    fn test_malformed_header() {
        for value in [
            "Token abc123",
            "bearer abc123",
            "Bearer",
            "Bearer ",
            "abc123",
            "Bearer abc Bearer def",
        ] {
            assert_eq!(
                extract_bearer(Some(value)),
                Err(BearerError::Malformed),
                "header {:?} should be malformed",
                value
            );
        }
    }

    #[test]
    fn test_authorization_header() {
        let headers = headers_with("Authorization", "Bearer abc123");

        assert_eq!(get_bearer_token(&headers).unwrap(), "abc123");
        assert_eq!(get_refresh_token(&headers), Err(BearerError::Missing));
    }

    #[test]
    fn test_refresh_header() {
        let headers = headers_with(REFRESH_TOKEN_HEADER, "Bearer deadbeef");

        assert_eq!(get_refresh_token(&headers).unwrap(), "deadbeef");
        assert_eq!(get_bearer_token(&headers), Err(BearerError::Missing));
    }

    #[test]
    fn test_non_utf8_header_is_malformed() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_bytes(b"Bearer \xff\xfe").unwrap());

        assert_eq!(get_bearer_token(&headers), Err(BearerError::Malformed));
    }
}
