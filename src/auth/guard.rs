use actix_web::{dev::Payload, web, FromRequest, HttpRequest};
use std::future::{ready, Ready};
use uuid::Uuid;

use crate::auth::token::extract_bearer;
use crate::error::AppError;
use crate::AppState;

/// Identity of the caller on access-token protected routes.
///
/// Extraction takes the bearer token and validates it as an access token.
/// Any failure (missing header, bad signature, expiry) rejects the request
/// with 401; there is no fallback to refresh-token semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedUser(pub Uuid);

impl AuthenticatedUser {
    pub fn id(&self) -> Uuid {
        self.0
    }

    /// Ownership check for mutations of user-owned resources.
    pub fn ensure_owns(&self, owner_id: Uuid) -> Result<(), AppError> {
        if self.0 == owner_id {
            Ok(())
        } else {
            Err(AppError::Forbidden("You can't modify another user's resource".into()))
        }
    }
}

impl FromRequest for AuthenticatedUser {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(authorize(req))
    }
}

fn authorize(req: &HttpRequest) -> Result<AuthenticatedUser, AppError> {
    let state = req
        .app_data::<web::Data<AppState>>()
        .ok_or_else(|| AppError::InternalError("application state not configured".into()))?;

    let token = extract_bearer(req.headers())?;
    let user_id = state.tokens.validate(token).map_err(|e| {
        tracing::debug!(error = %e, path = %req.path(), "rejected access token");
        e
    })?;

    Ok(AuthenticatedUser(user_id))
}
