//! Polka payment provider webhooks.

use actix_web::{web, HttpRequest, HttpResponse};
use serde::Deserialize;
use subtle::ConstantTimeEq;
use tracing::{info, debug};
use uuid::Uuid;

use crate::auth::token::extract_api_key;
use crate::error::{AppError, AuthError};
use crate::AppState;

pub const USER_UPGRADED: &str = "user.upgraded";

#[derive(Debug, Deserialize)]
pub struct PolkaEvent {
    pub event: String,
    pub data: PolkaEventData,
}

#[derive(Debug, Deserialize)]
pub struct PolkaEventData {
    pub user_id: String,
}

pub async fn polka_webhook(
    req: HttpRequest,
    body: web::Bytes,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    // The key is checked before the body is looked at
    let api_key = extract_api_key(req.headers())?;
    if !api_key_matches(api_key, &state.config.polka.api_key) {
        return Err(AuthError::InvalidApiKey.into());
    }

    let event: PolkaEvent = serde_json::from_slice(&body)
        .map_err(|e| AppError::ValidationError(format!("Invalid webhook body: {}", e)))?;

    if event.event != USER_UPGRADED {
        debug!(event = %event.event, "Ignoring Polka event");
        return Ok(HttpResponse::NoContent().finish());
    }

    let user_id = Uuid::parse_str(&event.data.user_id)
        .map_err(|_| AppError::ValidationError("Invalid user id".into()))?;

    if !state.store.upgrade_user_to_chirpy_red(user_id).await? {
        return Err(AppError::NotFound("User not found".into()));
    }

    info!(user_id = %user_id, "Upgraded user to Chirpy Red");
    Ok(HttpResponse::NoContent().finish())
}

/// An empty configured key rejects every call.
fn api_key_matches(presented: &str, expected: &str) -> bool {
    !expected.is_empty() && bool::from(presented.as_bytes().ct_eq(expected.as_bytes()))
}
