use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::db::models::{Chirp, RefreshToken, SortOrder, User};
use crate::db::Store;
use crate::error::{AppError, DatabaseError};

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    chirps: HashMap<Uuid, Chirp>,
    refresh_tokens: HashMap<String, RefreshToken>,
}

/// In-process `Store` mirroring the Postgres schema's constraints: unique
/// emails, unique refresh tokens, and cascading deletes from users.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn chirp_count(&self) -> usize {
        self.tables.read().await.chirps.len()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn create_user(&self, user: User) -> Result<User, AppError> {
        let mut tables = self.tables.write().await;
        if tables.users.values().any(|u| u.email == user.email) {
            return Err(DatabaseError::Duplicate.into());
        }
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn get_user_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables.users.values().find(|u| u.email == email).cloned())
    }

    async fn update_user(&self, id: Uuid, email: &str, hashed_password: &str) -> Result<User, AppError> {
        let mut tables = self.tables.write().await;
        if tables.users.values().any(|u| u.email == email && u.id != id) {
            return Err(DatabaseError::Duplicate.into());
        }
        let user = tables.users.get_mut(&id).ok_or(DatabaseError::NotFound)?;
        user.email = email.to_string();
        user.hashed_password = hashed_password.to_string();
        user.updated_at = Utc::now();
        Ok(user.clone())
    }

    async fn upgrade_user_to_chirpy_red(&self, id: Uuid) -> Result<bool, AppError> {
        let mut tables = self.tables.write().await;
        match tables.users.get_mut(&id) {
            Some(user) => {
                user.is_chirpy_red = true;
                user.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_all_users(&self) -> Result<u64, AppError> {
        let mut tables = self.tables.write().await;
        let deleted = tables.users.len() as u64;
        *tables = Tables::default();
        Ok(deleted)
    }

    async fn create_chirp(&self, chirp: Chirp) -> Result<Chirp, AppError> {
        let mut tables = self.tables.write().await;
        if !tables.users.contains_key(&chirp.user_id) {
            return Err(DatabaseError::QueryError("chirp author does not exist".into()).into());
        }
        tables.chirps.insert(chirp.id, chirp.clone());
        Ok(chirp)
    }

    async fn list_chirps(&self, author_id: Option<Uuid>, order: SortOrder) -> Result<Vec<Chirp>, AppError> {
        let tables = self.tables.read().await;
        let mut chirps: Vec<Chirp> = tables
            .chirps
            .values()
            .filter(|c| author_id.map_or(true, |author| c.user_id == author))
            .cloned()
            .collect();
        chirps.sort_by_key(|c| c.created_at);
        if order == SortOrder::Desc {
            chirps.reverse();
        }
        Ok(chirps)
    }

    async fn get_chirp(&self, id: Uuid) -> Result<Option<Chirp>, AppError> {
        Ok(self.tables.read().await.chirps.get(&id).cloned())
    }

    async fn delete_chirp(&self, id: Uuid) -> Result<(), AppError> {
        self.tables
            .write()
            .await
            .chirps
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| DatabaseError::NotFound.into())
    }

    async fn create_refresh_token(&self, token: RefreshToken) -> Result<RefreshToken, AppError> {
        let mut tables = self.tables.write().await;
        if !tables.users.contains_key(&token.user_id) {
            return Err(DatabaseError::QueryError("refresh token owner does not exist".into()).into());
        }
        if tables.refresh_tokens.contains_key(&token.token) {
            return Err(DatabaseError::Duplicate.into());
        }
        tables.refresh_tokens.insert(token.token.clone(), token.clone());
        Ok(token)
    }

    async fn get_refresh_token(&self, token: &str) -> Result<Option<RefreshToken>, AppError> {
        Ok(self.tables.read().await.refresh_tokens.get(token).cloned())
    }

    async fn revoke_refresh_token(&self, token: &str, at: DateTime<Utc>) -> Result<(), AppError> {
        let mut tables = self.tables.write().await;
        match tables.refresh_tokens.get_mut(token) {
            Some(row) if row.revoked_at.is_none() => {
                row.revoked_at = Some(at);
                row.updated_at = at;
                Ok(())
            }
            _ => Err(DatabaseError::NotFound.into()),
        }
    }
}
