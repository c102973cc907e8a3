//! Persistence layer
//!
//! Repository traits for users and chirps, plus the two backends that implement
//! them together with `RefreshTokenStore`: Postgres for deployments and an
//! in-process store for tests and local runs.

mod memory;
mod models;
mod postgres;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::DatabaseError;

pub use memory::MemoryStore;
pub use models::{Chirp, User};
pub use postgres::PgStore;

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Fails with `UniqueConstraintViolation` if the email is taken
    async fn create_user(&self, email: &str, hashed_password: &str) -> Result<User, DatabaseError>;

    async fn user_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError>;

    async fn user_by_id(&self, id: Uuid) -> Result<Option<User>, DatabaseError>;

    /// Overwrite email and password hash. `None` if the user does not exist.
    async fn update_credentials(
        &self,
        id: Uuid,
        email: &str,
        hashed_password: &str,
    ) -> Result<Option<User>, DatabaseError>;

    /// Set the Chirpy Red flag. `None` if the user does not exist.
    async fn upgrade_user(&self, id: Uuid) -> Result<Option<User>, DatabaseError>;
}

#[async_trait]
pub trait ChirpRepository: Send + Sync {
    async fn create_chirp(&self, body: &str, user_id: Uuid) -> Result<Chirp, DatabaseError>;

    /// All chirps, oldest first
    async fn all_chirps(&self) -> Result<Vec<Chirp>, DatabaseError>;

    async fn chirp_by_id(&self, id: Uuid) -> Result<Option<Chirp>, DatabaseError>;

    /// Returns `false` if there was nothing to delete
    async fn delete_chirp(&self, id: Uuid) -> Result<bool, DatabaseError>;
}
