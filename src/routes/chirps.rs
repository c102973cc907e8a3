use actix_web::{web, HttpResponse};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::{AppError, AuthError, DatabaseError, ErrorContext, ValidationError};
use crate::middleware::AuthenticatedUser;
use crate::state::AppState;
use crate::validators::clean_chirp_body;

#[derive(Deserialize)]
pub struct ChirpRequest {
    pub body: String,
}

fn parse_chirp_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| ValidationError::InvalidFormat("chirp id").into())
}

fn chirp_not_found() -> AppError {
    DatabaseError::NotFound("Chirp not found".to_string()).into()
}

/// POST /api/chirps
pub async fn create_chirp(
    user: AuthenticatedUser,
    form: web::Json<ChirpRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("chirp_creation").with_user_id(user.id());

    let body = clean_chirp_body(&form.body)?;
    let chirp = state.chirps.create_chirp(&body, user.id()).await?;

    tracing::info!(
        request_id = %context.request_id,
        user_id = %user.id(),
        chirp_id = %chirp.id,
        "Chirp created"
    );

    Ok(HttpResponse::Created().json(chirp))
}

/// GET /api/chirps
pub async fn get_chirps(state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    let chirps = state.chirps.all_chirps().await?;
    Ok(HttpResponse::Ok().json(chirps))
}

/// GET /api/chirps/{chirp_id}
pub async fn get_chirp(
    path: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let chirp_id = parse_chirp_id(&path)?;

    let chirp = state
        .chirps
        .chirp_by_id(chirp_id)
        .await?
        .ok_or_else(chirp_not_found)?;

    Ok(HttpResponse::Ok().json(chirp))
}

/// DELETE /api/chirps/{chirp_id}
///
/// Only the author may delete a chirp.
pub async fn delete_chirp(
    user: AuthenticatedUser,
    path: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let chirp_id = parse_chirp_id(&path)?;

    let chirp = state
        .chirps
        .chirp_by_id(chirp_id)
        .await?
        .ok_or_else(chirp_not_found)?;

    if chirp.user_id != user.id() {
        tracing::warn!(user_id = %user.id(), chirp_id = %chirp_id, "Attempt to delete another user's chirp");
        return Err(AuthError::Forbidden.into());
    }

    if !state.chirps.delete_chirp(chirp_id).await? {
        return Err(chirp_not_found());
    }

    Ok(HttpResponse::NoContent().finish())
}
