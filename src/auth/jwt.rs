//! JWT Token Generation and Validation
//!
//! Access tokens are stateless HMAC-signed JWTs. There is no revocation list; a
//! compromised token stays valid until its `exp`.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::Deserialize;
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

use crate::auth::claims::{Claims, ReceivedClaims, ISSUER};

const HMAC_ALGORITHMS: [Algorithm; 3] = [Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AccessTokenError {
    #[error("token is not signed with an HMAC algorithm")]
    BadAlgorithm,
    #[error("token signature is invalid")]
    BadSignature,
    #[error("token has expired")]
    Expired,
    #[error("token was issued by someone else")]
    WrongIssuer,
    #[error("token subject is not a user id")]
    MalformedSubject,
    #[error("token is malformed")]
    Malformed,
    #[error("token could not be signed: {0}")]
    Signing(String),
}

impl AccessTokenError {
    /// Short machine-readable cause used in logs
    pub fn cause(&self) -> &'static str {
        match self {
            AccessTokenError::BadAlgorithm => "bad_algorithm",
            AccessTokenError::BadSignature => "bad_signature",
            AccessTokenError::Expired => "expired",
            AccessTokenError::WrongIssuer => "wrong_issuer",
            AccessTokenError::MalformedSubject => "malformed_subject",
            AccessTokenError::Malformed => "malformed",
            AccessTokenError::Signing(_) => "signing",
        }
    }
}

/// Only the `alg` field of the header is inspected before the signature check
#[derive(Deserialize)]
struct RawHeader {
    alg: String,
}

/// Issues and verifies access tokens with one symmetric signing secret
#[derive(Clone)]
pub struct AccessTokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl fmt::Debug for AccessTokenCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessTokenCodec")
            .field("secret", &"[redacted]")
            .finish()
    }
}

impl AccessTokenCodec {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    /// Generate a new access token for a user
    ///
    /// # Errors
    /// Returns `Signing` if the claims cannot be encoded
    pub fn issue(&self, user_id: Uuid, ttl: Duration) -> Result<String, AccessTokenError> {
        let claims = Claims::new(user_id, ttl);

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AccessTokenError::Signing(e.to_string()))
    }

    /// Validate a token and return the user it was issued to
    ///
    /// Checks, in order: HMAC algorithm, signature, expiry, issuer, subject.
    pub fn verify(&self, token: &str) -> Result<Uuid, AccessTokenError> {
        check_algorithm(token)?;

        let mut validation = Validation::new(Algorithm::HS256);
        validation.algorithms = HMAC_ALGORITHMS.to_vec();
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);

        let claims = decode::<ReceivedClaims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidSignature => AccessTokenError::BadSignature,
                ErrorKind::ExpiredSignature => AccessTokenError::Expired,
                ErrorKind::InvalidAlgorithm => AccessTokenError::BadAlgorithm,
                _ => AccessTokenError::Malformed,
            })?;

        // jsonwebtoken compares whole seconds; expiry is checked again against the
        // sub-second clock so a token is rejected as soon as `exp` has passed.
        if claims.is_expired_at(Utc::now()) {
            return Err(AccessTokenError::Expired);
        }

        if !claims.has_issuer(ISSUER) {
            return Err(AccessTokenError::WrongIssuer);
        }

        claims.user_id()
    }
}

fn check_algorithm(token: &str) -> Result<(), AccessTokenError> {
    let segments: Vec<&str> = token.split('.').collect();
    if segments.len() != 3 {
        return Err(AccessTokenError::Malformed);
    }

    let raw = URL_SAFE_NO_PAD
        .decode(segments[0])
        .map_err(|_| AccessTokenError::Malformed)?;
    let header: RawHeader =
        serde_json::from_slice(&raw).map_err(|_| AccessTokenError::Malformed)?;

    match header.alg.as_str() {
        "HS256" | "HS384" | "HS512" => Ok(()),
        other => {
            tracing::debug!(alg = other, "Rejecting token with unexpected signing algorithm");
            Err(AccessTokenError::BadAlgorithm)
        }
    }
}

/// Generate an access token with an explicit secret
pub fn make_jwt(user_id: Uuid, secret: &str, ttl: Duration) -> Result<String, AccessTokenError> {
    AccessTokenCodec::new(secret).issue(user_id, ttl)
}

/// Validate an access token with an explicit secret
pub fn validate_jwt(token: &str, secret: &str) -> Result<Uuid, AccessTokenError> {
    AccessTokenCodec::new(secret).verify(token)
}
