use actix_web::{web, HttpResponse, HttpRequest};
use chrono::Duration;
use serde::{Deserialize, Serialize};
use tracing::{info, warn, debug};

use crate::auth::token::{extract_bearer, MAX_ACCESS_TOKEN_TTL};
use crate::error::{AppError, AuthError};
use crate::users::UserResponse;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    /// Optional shorter access token lifetime; capped at one hour.
    pub expires_in_seconds: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    #[serde(flatten)]
    pub user: UserResponse,
    pub token: String,
    pub refresh_token: String,
}

#[derive(Debug, Serialize)]
pub struct AccessTokenResponse {
    pub token: String,
}

pub async fn login(
    req: web::Json<LoginRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    info!("Received login request for email: {}", req.email);
    let requested_ttl = req.expires_in_seconds.map(requested_access_ttl);

    match state.auth.login(&req.email, &req.password, requested_ttl).await {
        Ok(session) => {
            info!("Login successful for email: {}", req.email);
            Ok(HttpResponse::Ok().json(LoginResponse {
                user: session.user.into(),
                token: session.access_token,
                refresh_token: session.refresh_token,
            }))
        }
        Err(e) => {
            warn!("Login failed for email: {}: {}", req.email, e);
            Err(e)
        }
    }
}

/// Clamps a client-supplied lifetime into `0..=MAX_ACCESS_TOKEN_TTL` so any
/// `i64` converts safely. Zero means the default lifetime.
fn requested_access_ttl(seconds: i64) -> Duration {
    Duration::seconds(seconds.clamp(0, MAX_ACCESS_TOKEN_TTL.num_seconds()))
}

pub async fn refresh(
    req: HttpRequest,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let refresh_token = extract_bearer(req.headers())?;
    let token = state.auth.refresh(refresh_token).await?;

    Ok(HttpResponse::Ok().json(AccessTokenResponse { token }))
}

pub async fn revoke(
    req: HttpRequest,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let refresh_token = extract_bearer(req.headers())?;

    match state.auth.revoke(refresh_token).await {
        Ok(()) => Ok(HttpResponse::NoContent().finish()),
        // Repeat revokes leave the token in the state the caller asked for
        Err(AppError::AuthError(AuthError::AlreadyRevoked)) => {
            debug!("Refresh token was already revoked");
            Ok(HttpResponse::NoContent().finish())
        }
        Err(e) => Err(e),
    }
}
