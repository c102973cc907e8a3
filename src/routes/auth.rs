//! Authentication Routes
//!
//! Login, access token refresh, and refresh token revocation.

use actix_web::{web, HttpRequest, HttpResponse};
use serde::{Deserialize, Serialize};

use crate::auth::{
    create_refresh_token, generate_refresh_token, get_refresh_token, revoke_refresh_token,
    validate_refresh_token,
};
use crate::error::{AppError, AuthError, ErrorContext};
use crate::routes::users::{CredentialsRequest, UserResponse};
use crate::state::AppState;

/// Login response: the user plus both tokens
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    #[serde(flatten)]
    pub user: UserResponse,
    pub token: String,
    pub refresh_token: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub token: String,
}

/// POST /api/login
///
/// Authenticate with email and password.
/// Returns a one-hour access token and a sixty-day refresh token.
///
/// # Errors
/// - 401: Invalid credentials (unknown email and wrong password look the same)
/// - 500: Refresh token could not be stored
pub async fn login(
    form: web::Json<CredentialsRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("user_login");

    let user = state
        .users
        .user_by_email(form.email.trim())
        .await?
        .ok_or(AuthError::InvalidCredentials)?;

    state.hasher.verify(&form.password, &user.hashed_password)?;

    let token = state
        .access_tokens
        .issue(user.id, state.jwt.access_token_ttl())?;

    let refresh_token = generate_refresh_token();
    create_refresh_token(
        state.refresh_tokens.as_ref(),
        &refresh_token,
        user.id,
        state.jwt.refresh_token_ttl(),
    )
    .await?;

    tracing::info!(
        request_id = %context.request_id,
        user_id = %user.id,
        "User logged in successfully"
    );

    Ok(HttpResponse::Ok().json(LoginResponse {
        user: user.into(),
        token,
        refresh_token,
    }))
}

/// POST /api/refresh
///
/// Mint a new access token from the refresh token in `X-Refresh-Token`.
/// The refresh token itself stays valid until it expires or is revoked.
///
/// # Errors
/// - 401: Missing, unknown, expired, or revoked refresh token
pub async fn refresh(
    req: HttpRequest,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("token_refresh");

    let refresh_token = get_refresh_token(req.headers())?;
    let user_id = validate_refresh_token(state.refresh_tokens.as_ref(), &refresh_token).await?;

    let token = state
        .access_tokens
        .issue(user_id, state.jwt.access_token_ttl())?;

    tracing::info!(
        request_id = %context.request_id,
        user_id = %user_id,
        "Access token refreshed"
    );

    Ok(HttpResponse::Ok().json(TokenResponse { token }))
}

/// POST /api/revoke
///
/// Revoke the refresh token in `X-Refresh-Token`. Revoking twice is not an error.
///
/// # Errors
/// - 401: Missing or unknown refresh token
pub async fn revoke(
    req: HttpRequest,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let refresh_token = get_refresh_token(req.headers())?;
    revoke_refresh_token(state.refresh_tokens.as_ref(), &refresh_token).await?;

    Ok(HttpResponse::NoContent().finish())
}
