use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use uuid::Uuid;

use crate::auth::{RefreshTokenError, RefreshTokenRecord, RefreshTokenStore};
use crate::database::{Chirp, ChirpRepository, User, UserRepository};
use crate::error::DatabaseError;

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    chirps: Vec<Chirp>,
    refresh_tokens: HashMap<String, RefreshTokenRecord>,
}

/// In-process store implementing every repository
///
/// One mutex guards all tables, so each operation is atomic. Clones share state.
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Tables>, String> {
        self.tables
            .lock()
            .map_err(|_| "memory store lock poisoned".to_string())
    }

    fn tables(&self) -> Result<MutexGuard<'_, Tables>, DatabaseError> {
        self.lock().map_err(DatabaseError::QueryExecution)
    }

    fn token_tables(&self) -> Result<MutexGuard<'_, Tables>, RefreshTokenError> {
        self.lock().map_err(RefreshTokenError::Persistence)
    }

    #[cfg(test)]
    pub(crate) async fn insert_test_user(&self, email: &str) -> Uuid {
        self.create_user(email, "unused-hash")
            .await
            .expect("Failed to insert test user")
            .id
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn create_user(&self, email: &str, hashed_password: &str) -> Result<User, DatabaseError> {
        let mut tables = self.tables()?;
        if tables.users.values().any(|user| user.email == email) {
            return Err(DatabaseError::UniqueConstraintViolation(format!(
                "email {} already registered",
                email
            )));
        }

        let now = Utc::now();
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

    async fn user_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError> {
        let tables = self.tables()?;
        Ok(tables.users.values().find(|user| user.email == email).cloned())
    }

    async fn user_by_id(&self, id: Uuid) -> Result<Option<User>, DatabaseError> {
        Ok(self.tables()?.users.get(&id).cloned())
    }

    async fn update_credentials(
        &self,
        id: Uuid,
        email: &str,
        hashed_password: &str,
    ) -> Result<Option<User>, DatabaseError> {
        let mut tables = self.tables()?;
        if tables
            .users
            .values()
            .any(|user| user.email == email && user.id != id)
        {
            return Err(DatabaseError::UniqueConstraintViolation(format!(
                "email {} already registered",
                email
            )));
        }

        Ok(tables.users.get_mut(&id).map(|user| {
            user.email = email.to_string();
            user.hashed_password = hashed_password.to_string();
            user.updated_at = Utc::now();
            user.clone()
        }))
    }

    async fn upgrade_user(&self, id: Uuid) -> Result<Option<User>, DatabaseError> {
        let mut tables = self.tables()?;
        Ok(tables.users.get_mut(&id).map(|user| {
            user.is_chirpy_red = true;
            user.updated_at = Utc::now();
            user.clone()
        }))
    }
}

#[async_trait]
impl ChirpRepository for MemoryStore {
    async fn create_chirp(&self, body: &str, user_id: Uuid) -> Result<Chirp, DatabaseError> {
        let mut tables = self.tables()?;
        if !tables.users.contains_key(&user_id) {
            return Err(DatabaseError::QueryExecution(format!(
                "chirp author {} does not exist",
                user_id
            )));
        }

        let now = Utc::now();
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

    async fn all_chirps(&self) -> Result<Vec<Chirp>, DatabaseError> {
        let mut chirps = self.tables()?.chirps.clone();
        chirps.sort_by_key(|chirp| chirp.created_at);
        Ok(chirps)
    }

    async fn chirp_by_id(&self, id: Uuid) -> Result<Option<Chirp>, DatabaseError> {
        let tables = self.tables()?;
        Ok(tables.chirps.iter().find(|chirp| chirp.id == id).cloned())
    }

    async fn delete_chirp(&self, id: Uuid) -> Result<bool, DatabaseError> {
        let mut tables = self.tables()?;
        let before = tables.chirps.len();
        tables.chirps.retain(|chirp| chirp.id != id);
        Ok(tables.chirps.len() < before)
    }
}

#[async_trait]
impl RefreshTokenStore for MemoryStore {
    async fn insert(&self, record: &RefreshTokenRecord) -> Result<(), RefreshTokenError> {
        let mut tables = self.token_tables()?;
        if tables.refresh_tokens.contains_key(&record.token) {
            return Err(RefreshTokenError::Persistence(
                "duplicate refresh token".to_string(),
            ));
        }
        if !tables.users.contains_key(&record.user_id) {
            return Err(RefreshTokenError::Persistence(format!(
                "refresh token owner {} does not exist",
                record.user_id
            )));
        }

        tables
            .refresh_tokens
            .insert(record.token.clone(), record.clone());
        Ok(())
    }

    async fn find(&self, token: &str) -> Result<Option<RefreshTokenRecord>, RefreshTokenError> {
        Ok(self.token_tables()?.refresh_tokens.get(token).cloned())
    }

    async fn mark_revoked(&self, token: &str, at: DateTime<Utc>) -> Result<bool, RefreshTokenError> {
        let mut tables = self.token_tables()?;
        match tables.refresh_tokens.get_mut(token) {
            None => Ok(false),
            Some(record) => {
                if record.revoked_at.is_none() {
                    record.revoked_at = Some(at);
                    record.updated_at = at;
                }
                Ok(true)
            }
        }
    }

    async fn owner_of(&self, token: &str) -> Result<Option<Uuid>, RefreshTokenError> {
        let tables = self.token_tables()?;
        Ok(tables
            .refresh_tokens
            .get(token)
            .and_then(|record| tables.users.get(&record.user_id))
            .map(|user| user.id))
    }
}
