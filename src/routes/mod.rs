mod admin;
mod auth;
mod chirps;
mod health_check;
mod users;
mod webhooks;

pub use admin::{metrics, reset};
pub use auth::{login, refresh, revoke, LoginResponse, TokenResponse};
pub use chirps::{create_chirp, delete_chirp, get_chirp, get_chirps};
pub use health_check::health_check;
pub use users::{create_user, update_user, UserResponse};
pub use webhooks::polka_webhook;
