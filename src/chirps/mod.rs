//! Chirp endpoints: short posts owned by the user who wrote them.

pub mod validate;

use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::auth::AuthenticatedUser;
use crate::db::{Chirp, SortOrder};
use crate::error::AppError;
use crate::AppState;

pub use validate::{clean_body, validate_chirp, MAX_CHIRP_LENGTH};

#[derive(Debug, Deserialize)]
pub struct ChirpRequest {
    pub body: String,
}

#[derive(Debug, Deserialize)]
pub struct ListChirpsQuery {
    pub author_id: Option<Uuid>,
    #[serde(default)]
    pub sort: SortOrder,
}

#[derive(Debug, Serialize)]
pub struct CleanedBody {
    pub cleaned_body: String,
}

pub async fn create_chirp(
    user: AuthenticatedUser,
    req: web::Json<ChirpRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let body = validate_chirp(&req.body)?;
    let chirp = state.store.create_chirp(Chirp::new(user.id(), body)).await?;

    info!(chirp_id = %chirp.id, user_id = %chirp.user_id, "Created chirp");
    Ok(HttpResponse::Created().json(chirp))
}

pub async fn list_chirps(
    query: web::Query<ListChirpsQuery>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let chirps = state.store.list_chirps(query.author_id, query.sort).await?;
    Ok(HttpResponse::Ok().json(chirps))
}

pub async fn get_chirp(
    path: web::Path<Uuid>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let chirp = state
        .store
        .get_chirp(path.into_inner())
        .await?
        .ok_or_else(|| AppError::NotFound("Chirp not found".into()))?;

    Ok(HttpResponse::Ok().json(chirp))
}

pub async fn delete_chirp(
    user: AuthenticatedUser,
    path: web::Path<Uuid>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let chirp_id = path.into_inner();
    let chirp = state
        .store
        .get_chirp(chirp_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Chirp not found".into()))?;

    user.ensure_owns(chirp.user_id)?;
    state.store.delete_chirp(chirp_id).await?;

    info!(chirp_id = %chirp_id, user_id = %user.id(), "Deleted chirp");
    Ok(HttpResponse::NoContent().finish())
}

/// Dry run of chirp validation; nothing is stored.
pub async fn validate(req: web::Json<ChirpRequest>) -> Result<HttpResponse, AppError> {
    let cleaned_body = validate_chirp(&req.body)?;
    Ok(HttpResponse::Ok().json(CleanedBody { cleaned_body }))
}
