use std::sync::Arc;

use crate::auth::{AccessTokenCodec, BcryptHasher, PasswordHasher, RefreshTokenStore};
use crate::configuration::JwtSettings;
use crate::database::{ChirpRepository, UserRepository};

/// Everything a request handler needs, shared across workers
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserRepository>,
    pub chirps: Arc<dyn ChirpRepository>,
    pub refresh_tokens: Arc<dyn RefreshTokenStore>,
    pub hasher: Arc<dyn PasswordHasher>,
    pub access_tokens: AccessTokenCodec,
    pub jwt: JwtSettings,
}

impl AppState {
    /// Build state over one store that backs every repository
    pub fn new<S>(store: S, jwt: JwtSettings) -> Self
    where
        S: UserRepository + ChirpRepository + RefreshTokenStore + 'static,
    {
        let store = Arc::new(store);
        Self {
            users: store.clone(),
            chirps: store.clone(),
            refresh_tokens: store,
            hasher: Arc::new(BcryptHasher::default()),
            access_tokens: AccessTokenCodec::new(&jwt.secret),
            jwt,
        }
    }

    pub fn with_hasher(mut self, hasher: impl PasswordHasher + 'static) -> Self {
        self.hasher = Arc::new(hasher);
        self
    }
}
