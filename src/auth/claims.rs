//! JWT Claims structure
//!
//! Registered claims (RFC 7519) carried by every access token. Timestamps are
//! Unix seconds in UTC.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::jwt::AccessTokenError;

/// Issuer tag stamped into and required from every access token
pub const ISSUER: &str = "chirpy";

/// JWT Claims for access tokens
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    /// Issuer
    pub iss: String,
    /// Subject (user ID as UUID string)
    pub sub: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

impl Claims {
    /// Create claims for `user_id` valid for `ttl` from now
    ///
    /// Both timestamps are truncated to whole seconds.
    pub fn new(user_id: Uuid, ttl: Duration) -> Self {
        Self::issued_at(user_id, Utc::now(), ttl)
    }

    pub fn issued_at(user_id: Uuid, now: DateTime<Utc>, ttl: Duration) -> Self {
        Self {
            iss: ISSUER.to_string(),
            sub: user_id.to_string(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        }
    }

    /// Extract user ID from claims
    ///
    /// # Errors
    /// Returns `MalformedSubject` if `sub` is not a valid UUID
    pub fn user_id(&self) -> Result<Uuid, AccessTokenError> {
        Uuid::parse_str(&self.sub).map_err(|_| AccessTokenError::MalformedSubject)
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.exp, 0)
    }

    /// True once `now` has passed the expiry instant
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        match self.expires_at() {
            Some(expires_at) => now > expires_at,
            None => true,
        }
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }
}

/// Claims as read back from a signed token
///
/// Only `exp` must be well-formed for decoding to succeed; `iss` and `sub` are
/// kept as raw JSON so that a bad value is reported as the claim that is wrong.
#[derive(Debug, Deserialize)]
pub(crate) struct ReceivedClaims {
    #[serde(default)]
    iss: Option<serde_json::Value>,
    #[serde(default)]
    sub: Option<serde_json::Value>,
    exp: i64,
}

impl ReceivedClaims {
    pub(crate) fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        match DateTime::from_timestamp(self.exp, 0) {
            Some(expires_at) => now > expires_at,
            None => true,
        }
    }

    pub(crate) fn has_issuer(&self, issuer: &str) -> bool {
        self.iss.as_ref().and_then(|iss| iss.as_str()) == Some(issuer)
    }

    /// Missing, non-string and non-UUID subjects are all `MalformedSubject`
    pub(crate) fn user_id(&self) -> Result<Uuid, AccessTokenError> {
        self.sub
            .as_ref()
            .and_then(|sub| sub.as_str())
            .and_then(|sub| Uuid::parse_str(sub).ok())
            .ok_or(AccessTokenError::MalformedSubject)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claims_creation() {
        let user_id = Uuid::new_v4();
        let claims = Claims::new(user_id, Duration::hours(1));

        assert_eq!(claims.sub, user_id.to_string());
        assert_eq!(claims.iss, ISSUER);
        assert_eq!(claims.exp - claims.iat, 3600);
        assert!(!claims.is_expired());
    }

    #[test]
    fn test_user_id_extraction() {
        let user_id = Uuid::new_v4();
        let claims = Claims::new(user_id, Duration::hours(1));

        assert_eq!(claims.user_id().unwrap(), user_id);
    }

    #[test]
    fn test_invalid_user_id() {
        let mut claims = Claims::new(Uuid::new_v4(), Duration::hours(1));
        claims.sub = "invalid-uuid".to_string();

        assert_eq!(claims.user_id(), Err(AccessTokenError::MalformedSubject));
    }

    #[test]
    fn test_expiry_is_truncated_to_seconds() {
        let now = DateTime::from_timestamp(1_700_000_000, 900_000_000).unwrap();
        let claims = Claims::issued_at(Uuid::new_v4(), now, Duration::milliseconds(50));

        assert_eq!(claims.iat, 1_700_000_000);
        assert_eq!(claims.exp, 1_700_000_000);
        // The exact expiry instant is still valid; anything after it is not
        assert!(!claims.is_expired_at(DateTime::from_timestamp(1_700_000_000, 0).unwrap()));
        assert!(claims.is_expired_at(now));
    }

    fn received(value: serde_json::Value) -> ReceivedClaims {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_received_subject_must_be_uuid_string() {
        let user_id = Uuid::new_v4();
        let exp = Utc::now().timestamp() + 3600;

        let valid = received(serde_json::json!({ "iss": ISSUER, "sub": user_id.to_string(), "exp": exp }));
        assert_eq!(valid.user_id(), Ok(user_id));

        for sub in [serde_json::json!(42), serde_json::json!(null), serde_json::json!("42")] {
            let claims = received(serde_json::json!({ "iss": ISSUER, "sub": sub, "exp": exp }));
            assert_eq!(claims.user_id(), Err(AccessTokenError::MalformedSubject));
        }

        let missing = received(serde_json::json!({ "iss": ISSUER, "exp": exp }));
        assert_eq!(missing.user_id(), Err(AccessTokenError::MalformedSubject));
    }

    #[test]
    fn test_received_issuer() {
        let exp = Utc::now().timestamp() + 3600;

        assert!(received(serde_json::json!({ "iss": ISSUER, "exp": exp })).has_issuer(ISSUER));
        assert!(!received(serde_json::json!({ "iss": 7, "exp": exp })).has_issuer(ISSUER));
        assert!(!received(serde_json::json!({ "exp": exp })).has_issuer(ISSUER));
    }
}
