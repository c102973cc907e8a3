//! User Routes
//!
//! Registration and credential updates. Passwords are hashed before they reach
//! the repository and never leave the service.

use actix_web::{web, HttpResponse};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::database::User;
use crate::error::{AppError, DatabaseError, ErrorContext};
use crate::middleware::AuthenticatedUser;
use crate::state::AppState;
use crate::validators::{is_valid_email, is_valid_password};

#[derive(Deserialize)]
pub struct CredentialsRequest {
    pub email: String,
    pub password: String,
}

/// Public view of a user
#[derive(Debug, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub email: String,
    pub is_chirpy_red: bool,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            created_at: user.created_at,
            updated_at: user.updated_at,
            email: user.email,
            is_chirpy_red: user.is_chirpy_red,
        }
    }
}

fn validated_credentials(form: &CredentialsRequest) -> Result<String, AppError> {
    let email = is_valid_email(&form.email)?;
    is_valid_password(&form.password)?;
    Ok(email)
}

/// POST /api/users
///
/// # Errors
/// - 400: Invalid email or empty password
/// - 409: Email already registered
pub async fn create_user(
    form: web::Json<CredentialsRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("user_registration");

    let email = validated_credentials(&form)?;
    let hashed_password = state.hasher.hash(&form.password)?;

    let user = state.users.create_user(&email, &hashed_password).await?;

    tracing::info!(
        request_id = %context.request_id,
        user_id = %user.id,
        "User registered successfully"
    );

    Ok(HttpResponse::Created().json(UserResponse::from(user)))
}

/// PUT /api/users
///
/// Replaces the authenticated user's email and password.
/// **Requires a valid access token.**
pub async fn update_user(
    user: AuthenticatedUser,
    form: web::Json<CredentialsRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("user_update").with_user_id(user.id());

    let email = validated_credentials(&form)?;
    let hashed_password = state.hasher.hash(&form.password)?;

    let updated = state
        .users
        .update_credentials(user.id(), &email, &hashed_password)
        .await?
        .ok_or_else(|| DatabaseError::NotFound("User not found".to_string()))?;

    tracing::info!(
        request_id = %context.request_id,
        user_id = %updated.id,
        "User credentials updated"
    );

    Ok(HttpResponse::Ok().json(UserResponse::from(updated)))
}
