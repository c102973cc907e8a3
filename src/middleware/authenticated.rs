//! Access token authentication for route handlers
//!
//! Pulls `Authorization: Bearer <token>`, verifies it with the shared codec and
//! hands the handler the user id the token was issued to.

use actix_web::{dev::Payload, web, FromRequest, HttpRequest};
use std::future::{ready, Ready};
use uuid::Uuid;

use crate::auth::get_bearer_token;
use crate::error::AppError;
use crate::state::AppState;

/// The user a verified access token belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedUser(pub Uuid);

impl AuthenticatedUser {
    pub fn id(&self) -> Uuid {
        self.0
    }
}

fn authenticate(req: &HttpRequest) -> Result<AuthenticatedUser, AppError> {
    let state = req
        .app_data::<web::Data<AppState>>()
        .ok_or_else(|| AppError::Internal("application state is not configured".to_string()))?;

    let token = get_bearer_token(req.headers())?;
    let user_id = state.access_tokens.verify(&token)?;

    tracing::debug!(user_id = %user_id, "Access token validated");
    Ok(AuthenticatedUser(user_id))
}

impl FromRequest for AuthenticatedUser {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(authenticate(req))
    }
}
