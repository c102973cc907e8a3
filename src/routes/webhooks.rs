use actix_web::{web, HttpResponse};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::{AppError, DatabaseError, ValidationError};
use crate::state::AppState;

const USER_UPGRADED: &str = "user.upgraded";

#[derive(Deserialize)]
pub struct WebhookData {
    pub user_id: String,
}

#[derive(Deserialize)]
pub struct WebhookRequest {
    pub event: String,
    pub data: WebhookData,
}

/// POST /api/polka/webhooks
///
/// Payment provider callback. Only `user.upgraded` has an effect; every other
/// event is acknowledged and ignored.
pub async fn polka_webhook(
    form: web::Json<WebhookRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    if form.event != USER_UPGRADED {
        tracing::debug!(event = %form.event, "Ignoring webhook event");
        return Ok(HttpResponse::NoContent().finish());
    }

    let user_id = Uuid::parse_str(&form.data.user_id)
        .map_err(|_| ValidationError::InvalidFormat("user_id"))?;

    state
        .users
        .upgrade_user(user_id)
        .await?
        .ok_or_else(|| DatabaseError::NotFound("User not found".to_string()))?;

    tracing::info!(user_id = %user_id, "User upgraded to Chirpy Red");
    Ok(HttpResponse::NoContent().finish())
}
