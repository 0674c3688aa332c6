use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use uuid::Uuid;

use crate::auth::password::{hash_password, verify_password};
use crate::auth::token::{issue_refresh_token, TokenService};
use crate::db::models::{RefreshToken, User};
use crate::db::Store;
use crate::error::{AppError, AuthError, DatabaseError};

/// Result of a successful login.
#[derive(Debug, Clone)]
pub struct Session {
    pub user: User,
    pub access_token: String,
    pub refresh_token: String,
}

/// Credential and session lifecycle: registration, login, refresh and
/// revocation on top of a `Store`.
pub struct AuthService {
    store: Arc<dyn Store>,
    tokens: TokenService,
    refresh_ttl: Duration,
}

impl AuthService {
    pub fn new(store: Arc<dyn Store>, tokens: TokenService, refresh_ttl: Duration) -> Self {
        Self {
            store,
            tokens,
            refresh_ttl,
        }
    }

    pub async fn register(&self, email: &str, password: &str) -> Result<User, AppError> {
        validate_credentials(email, password)?;
        let hashed = hash_blocking(password.to_string()).await?;
        self.store.create_user(User::new(email.to_string(), hashed)).await
    }

    pub async fn update_credentials(&self, user_id: Uuid, email: &str, password: &str) -> Result<User, AppError> {
        validate_credentials(email, password)?;
        if self.store.get_user_by_id(user_id).await?.is_none() {
            tracing::debug!(user_id = %user_id, "Access token refers to a deleted user");
            return Err(AuthError::InvalidToken.into());
        }

        let hashed = hash_blocking(password.to_string()).await?;
        match self.store.update_user(user_id, email, &hashed).await {
            // The token outlived its user (e.g. after an admin reset)
            Err(AppError::DatabaseError(DatabaseError::NotFound)) => Err(AuthError::InvalidToken.into()),
            other => other,
        }
    }

    /// Checks the password and opens a new session. `requested_ttl` may only
    /// shorten the access token's lifetime.
    pub async fn login(
        &self,
        email: &str,
        password: &str,
        requested_ttl: Option<Duration>,
    ) -> Result<Session, AppError> {
        let user = self
            .store
            .get_user_by_email(email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        let hash = user.hashed_password.clone();
        let password = password.to_string();
        let matched = tokio::task::spawn_blocking(move || verify_password(&password, &hash))
            .await
            .map_err(|e| AppError::InternalError(e.to_string()))??;
        if !matched {
            return Err(AuthError::InvalidCredentials.into());
        }

        let access_token = self.tokens.issue_access_with_ttl(user.id, requested_ttl)?;
        let refresh_token = issue_refresh_token()?;
        self.store
            .create_refresh_token(RefreshToken::new(refresh_token.clone(), user.id, self.refresh_ttl))
            .await?;

        tracing::info!(user_id = %user.id, "session opened");
        Ok(Session {
            user,
            access_token,
            refresh_token,
        })
    }

    pub async fn refresh(&self, refresh_token: &str) -> Result<String, AppError> {
        self.refresh_at(refresh_token, Utc::now()).await
    }

    /// Mints a new access token from a live refresh token. The refresh token
    /// is not rotated.
    pub async fn refresh_at(&self, refresh_token: &str, now: DateTime<Utc>) -> Result<String, AppError> {
        let row = self
            .store
            .get_refresh_token(refresh_token)
            .await?
            .ok_or(AuthError::UnknownRefreshToken)?;

        if row.is_revoked() {
            return Err(AuthError::RefreshTokenRevoked.into());
        }
        if row.is_expired_at(now) {
            return Err(AuthError::RefreshTokenExpired.into());
        }

        Ok(self.tokens.issue_access(row.user_id)?)
    }

    pub async fn revoke(&self, refresh_token: &str) -> Result<(), AppError> {
        self.revoke_at(refresh_token, Utc::now()).await
    }

    pub async fn revoke_at(&self, refresh_token: &str, now: DateTime<Utc>) -> Result<(), AppError> {
        let row = self
            .store
            .get_refresh_token(refresh_token)
            .await?
            .ok_or(AuthError::UnknownRefreshToken)?;

        if row.is_revoked() {
            return Err(AuthError::AlreadyRevoked.into());
        }

        match self.store.revoke_refresh_token(refresh_token, now).await {
            Ok(()) => {
                tracing::info!(user_id = %row.user_id, "refresh token revoked");
                Ok(())
            }
            // Lost a race with a concurrent revoke
            Err(AppError::DatabaseError(DatabaseError::NotFound)) => Err(AuthError::AlreadyRevoked.into()),
            Err(e) => Err(e),
        }
    }
}

fn validate_credentials(email: &str, password: &str) -> Result<(), AppError> {
    if email.trim().is_empty() || !email.contains('@') {
        return Err(AppError::ValidationError("A valid email is required".into()));
    }
    if password.is_empty() {
        return Err(AppError::ValidationError("Password must not be empty".into()));
    }
    Ok(())
}

async fn hash_blocking(password: String) -> Result<String, AppError> {
    let hashed = tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| AppError::InternalError(e.to_string()))??;
    Ok(hashed)
}
