//! Database module for Chirpy
//!
//! `Store` is the narrow persistence interface the handlers and the auth
//! flows depend on. `DbOperations` backs it with Postgres, `MemoryStore`
//! keeps everything in process.

pub mod memory;
pub mod models;
pub mod operations;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::AppError;

pub use memory::MemoryStore;
pub use models::{Chirp, RefreshToken, SortOrder, User};
pub use operations::DbOperations;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Store: Send + Sync {
    // Users
    async fn create_user(&self, user: User) -> Result<User, AppError>;
    async fn get_user_by_id(&self, id: Uuid) -> Result<Option<User>, AppError>;
    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, AppError>;
    async fn update_user(&self, id: Uuid, email: &str, hashed_password: &str) -> Result<User, AppError>;
    /// Returns false when no user has `id`.
    async fn upgrade_user_to_chirpy_red(&self, id: Uuid) -> Result<bool, AppError>;
    /// Deletes every user; chirps and refresh tokens cascade.
    async fn delete_all_users(&self) -> Result<u64, AppError>;

    // Chirps
    async fn create_chirp(&self, chirp: Chirp) -> Result<Chirp, AppError>;
    async fn list_chirps(&self, author_id: Option<Uuid>, order: SortOrder) -> Result<Vec<Chirp>, AppError>;
    async fn get_chirp(&self, id: Uuid) -> Result<Option<Chirp>, AppError>;
    async fn delete_chirp(&self, id: Uuid) -> Result<(), AppError>;

    // Sessions
    async fn create_refresh_token(&self, token: RefreshToken) -> Result<RefreshToken, AppError>;
    async fn get_refresh_token(&self, token: &str) -> Result<Option<RefreshToken>, AppError>;
    async fn revoke_refresh_token(&self, token: &str, at: DateTime<Utc>) -> Result<(), AppError>;
}
