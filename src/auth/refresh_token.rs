//! Refresh Token Management
//!
//! Handles refresh token generation, storage, validation, and revocation.
//! Refresh tokens are:
//! - 32 random bytes from the OS generator, hex encoded
//! - Persisted one row per login, keyed by the token itself
//! - Revocable exactly once; expired or revoked tokens never become valid again
//!
//! Expiry is checked lazily on validation. Rows are never deleted here.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use rand::rngs::OsRng;
use rand::RngCore;
use thiserror::Error;
use uuid::Uuid;

const REFRESH_TOKEN_BYTES: usize = 32;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RefreshTokenError {
    #[error("refresh token not found")]
    NotFound,
    #[error("refresh token has been revoked")]
    Revoked,
    #[error("refresh token has expired")]
    Expired,
    /// The backing store rejected or failed the operation
    #[error("refresh token storage failed: {0}")]
    Persistence(String),
}

impl RefreshTokenError {
    pub fn cause(&self) -> &'static str {
        match self {
            RefreshTokenError::NotFound => "not_found",
            RefreshTokenError::Revoked => "revoked",
            RefreshTokenError::Expired => "expired",
            RefreshTokenError::Persistence(_) => "persistence",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenState {
    Active,
    Expired,
    Revoked,
}

/// One persisted refresh token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshTokenRecord {
    pub token: String,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub revoked_at: Option<DateTime<Utc>>,
}

impl RefreshTokenRecord {
    pub fn new(token: String, user_id: Uuid, now: DateTime<Utc>, ttl: Duration) -> Self {
        Self {
            token,
            user_id,
            created_at: now,
            updated_at: now,
            expires_at: now + ttl,
            revoked_at: None,
        }
    }

    /// Revocation takes precedence over expiry
    pub fn state(&self, now: DateTime<Utc>) -> TokenState {
        if self.revoked_at.is_some() {
            TokenState::Revoked
        } else if now > self.expires_at {
            TokenState::Expired
        } else {
            TokenState::Active
        }
    }
}

/// Persistence boundary for refresh tokens
///
/// Implementations must make `mark_revoked` atomic per row: it only sets
/// `revoked_at` when it is still empty.
#[async_trait]
pub trait RefreshTokenStore: Send + Sync {
    /// Insert a new row. Fails if the token already exists.
    async fn insert(&self, record: &RefreshTokenRecord) -> Result<(), RefreshTokenError>;

    async fn find(&self, token: &str) -> Result<Option<RefreshTokenRecord>, RefreshTokenError>;

    /// Set `revoked_at` if unset. Returns `false` when no such token exists.
    async fn mark_revoked(&self, token: &str, at: DateTime<Utc>) -> Result<bool, RefreshTokenError>;

    /// Resolve the user owning `token` through the users table
    async fn owner_of(&self, token: &str) -> Result<Option<Uuid>, RefreshTokenError>;
}

/// Generate a new cryptographically secure refresh token
pub fn generate_refresh_token() -> String {
    let mut bytes = [0u8; REFRESH_TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Save a refresh token for `user_id`, valid for `ttl`
///
/// # Errors
/// Returns `Persistence` if the store rejects the row (duplicate token, connectivity)
pub async fn create_refresh_token(
    store: &dyn RefreshTokenStore,
    token: &str,
    user_id: Uuid,
    ttl: Duration,
) -> Result<RefreshTokenRecord, RefreshTokenError> {
    let record = RefreshTokenRecord::new(token.to_string(), user_id, Utc::now(), ttl);
    store.insert(&record).await?;

    tracing::debug!(user_id = %user_id, expires_at = %record.expires_at, "Refresh token stored");
    Ok(record)
}

pub async fn lookup_refresh_token(
    store: &dyn RefreshTokenStore,
    token: &str,
) -> Result<RefreshTokenRecord, RefreshTokenError> {
    store.find(token).await?.ok_or(RefreshTokenError::NotFound)
}

/// Validate a refresh token
///
/// Checks:
/// 1. Token exists
/// 2. Token has not been revoked
/// 3. Token has not expired
///
/// # Returns
/// User ID associated with the token if valid
pub async fn validate_refresh_token(
    store: &dyn RefreshTokenStore,
    token: &str,
) -> Result<Uuid, RefreshTokenError> {
    let record = lookup_refresh_token(store, token).await.map_err(|e| {
        if e == RefreshTokenError::NotFound {
            tracing::warn!("Refresh token not found");
        }
        e
    })?;

    match record.state(Utc::now()) {
        TokenState::Revoked => {
            tracing::warn!(user_id = %record.user_id, "Attempt to use revoked refresh token");
            Err(RefreshTokenError::Revoked)
        }
        TokenState::Expired => {
            tracing::info!(user_id = %record.user_id, "Refresh token expired");
            Err(RefreshTokenError::Expired)
        }
        TokenState::Active => store
            .owner_of(token)
            .await?
            .ok_or(RefreshTokenError::NotFound),
    }
}

/// Revoke a single refresh token
///
/// Revoking an already revoked token succeeds and keeps the original `revoked_at`.
///
/// # Errors
/// Returns `NotFound` for an unknown token
pub async fn revoke_refresh_token(
    store: &dyn RefreshTokenStore,
    token: &str,
) -> Result<(), RefreshTokenError> {
    if !store.mark_revoked(token, Utc::now()).await? {
        return Err(RefreshTokenError::NotFound);
    }

    tracing::info!("Refresh token revoked");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MemoryStore;
    use std::sync::Arc;

    async fn store_with_user() -> (MemoryStore, Uuid) {
        let store = MemoryStore::new();
        let user = store.insert_test_user("walt@breakingbad.com").await;
        (store, user)
    }

    #[test]
    fn test_generate_refresh_token() {
        let token = generate_refresh_token();

        assert_eq!(token.len(), 64);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_tokens_are_unique() {
        let tokens: std::collections::HashSet<String> =
            (0..1000).map(|_| generate_refresh_token()).collect();

        assert_eq!(tokens.len(), 1000);
    }

    #[test]
    fn test_state_transitions() {
        let now = Utc::now();
        let mut record = RefreshTokenRecord::new("t".into(), Uuid::new_v4(), now, Duration::days(60));

        assert_eq!(record.state(now), TokenState::Active);
        assert_eq!(record.state(now + Duration::days(61)), TokenState::Expired);

        record.revoked_at = Some(now);
        assert_eq!(record.state(now), TokenState::Revoked);
        assert_eq!(record.state(now + Duration::days(61)), TokenState::Revoked);
    }

    #[tokio::test]
    async fn test_create_then_validate() {
        let (store, user_id) = store_with_user().await;
        let token = generate_refresh_token();

        let record = create_refresh_token(&store, &token, user_id, Duration::days(60))
            .await
            .unwrap();

        assert_eq!(record.revoked_at, None);
        assert_eq!(record.expires_at - record.created_at, Duration::days(60));
        assert_eq!(validate_refresh_token(&store, &token).await.unwrap(), user_id);
    }

    #[tokio::test]
    async fn test_revoked_token_is_rejected() {
        let (store, user_id) = store_with_user().await;
        let token = generate_refresh_token();
        create_refresh_token(&store, &token, user_id, Duration::days(60))
            .await
            .unwrap();

        revoke_refresh_token(&store, &token).await.unwrap();

        assert_eq!(
            validate_refresh_token(&store, &token).await,
            Err(RefreshTokenError::Revoked)
        );
    }

    #[tokio::test]
    async fn test_unknown_token() {
        let (store, _) = store_with_user().await;

        assert_eq!(
            validate_refresh_token(&store, "nonexistent").await,
            Err(RefreshTokenError::NotFound)
        );
        assert_eq!(
            revoke_refresh_token(&store, "nonexistent").await,
            Err(RefreshTokenError::NotFound)
        );
    }

    #[tokio::test]
    async fn test_expired_token() {
        let (store, user_id) = store_with_user().await;
        let token = generate_refresh_token();
        create_refresh_token(&store, &token, user_id, Duration::seconds(-1))
            .await
            .unwrap();

        assert_eq!(
            validate_refresh_token(&store, &token).await,
            Err(RefreshTokenError::Expired)
        );
    }

    #[tokio::test]
    async fn test_duplicate_token_is_persistence_failure() {
        let (store, user_id) = store_with_user().await;
        let token = generate_refresh_token();
        create_refresh_token(&store, &token, user_id, Duration::days(60))
            .await
            .unwrap();

        let result = create_refresh_token(&store, &token, user_id, Duration::days(60)).await;

        assert!(matches!(result, Err(RefreshTokenError::Persistence(_))));
    }

    #[tokio::test]
    async fn test_revoke_is_idempotent() {
        let (store, user_id) = store_with_user().await;
        let token = generate_refresh_token();
        create_refresh_token(&store, &token, user_id, Duration::days(60))
            .await
            .unwrap();

        revoke_refresh_token(&store, &token).await.unwrap();
        let first = lookup_refresh_token(&store, &token).await.unwrap().revoked_at;

        revoke_refresh_token(&store, &token).await.unwrap();
        let second = lookup_refresh_token(&store, &token).await.unwrap().revoked_at;

        assert!(first.is_some());
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_concurrent_revokes() {
        let (store, user_id) = store_with_user().await;
        let store = Arc::new(store);
        let token = generate_refresh_token();
        create_refresh_token(store.as_ref(), &token, user_id, Duration::days(60))
            .await
            .unwrap();

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let store = Arc::clone(&store);
                let token = token.clone();
                tokio::spawn(async move { revoke_refresh_token(store.as_ref(), &token).await })
            })
            .collect();

        for handle in handles {
            assert!(handle.await.unwrap().is_ok());
        }

        let record = lookup_refresh_token(store.as_ref(), &token).await.unwrap();
        assert!(record.revoked_at.is_some());
        assert_eq!(record.updated_at, record.revoked_at.unwrap());
        assert_eq!(
            validate_refresh_token(store.as_ref(), &token).await,
            Err(RefreshTokenError::Revoked)
        );
    }

    #[tokio::test]
    async fn test_tokens_of_other_users_are_independent() {
        let (store, alice) = store_with_user().await;
        let bob = store.insert_test_user("bob@example.com").await;
        let alice_token = generate_refresh_token();
        let bob_token = generate_refresh_token();
        create_refresh_token(&store, &alice_token, alice, Duration::days(60)).await.unwrap();
        create_refresh_token(&store, &bob_token, bob, Duration::days(60)).await.unwrap();

        revoke_refresh_token(&store, &alice_token).await.unwrap();

        assert_eq!(validate_refresh_token(&store, &bob_token).await.unwrap(), bob);
    }
}
