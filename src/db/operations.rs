use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use crate::db::models::{Chirp, RefreshToken, SortOrder, User};
use crate::db::Store;
use crate::error::{AppError, DatabaseError};

const USER_COLUMNS: &str = "id, created_at, updated_at, email, hashed_password, is_chirpy_red";
const CHIRP_COLUMNS: &str = "id, created_at, updated_at, body, user_id";
const REFRESH_TOKEN_COLUMNS: &str = "token, created_at, updated_at, user_id, expires_at, revoked_at";

pub struct DbOperations {
    pool: Arc<PgPool>,
}

impl DbOperations {
    pub async fn new_with_options(
        url: &str,
        max_connections: u32,
        acquire_timeout: Duration,
    ) -> Result<Self, AppError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(acquire_timeout)
            .connect(url)
            .await
            .map_err(|e| DatabaseError::ConnectionError(e.to_string()))?;

        Ok(Self { pool: Arc::new(pool) })
    }

    pub async fn run_migrations(&self) -> Result<(), AppError> {
        sqlx::migrate!("./migrations").run(self.pool.as_ref()).await?;
        Ok(())
    }
}

#[async_trait]
impl Store for DbOperations {
    async fn create_user(&self, user: User) -> Result<User, AppError> {
        let sql = format!(
            "INSERT INTO users ({USER_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6) RETURNING {USER_COLUMNS}"
        );
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(user.id)
            .bind(user.created_at)
            .bind(user.updated_at)
            .bind(&user.email)
            .bind(&user.hashed_password)
            .bind(user.is_chirpy_red)
            .fetch_one(self.pool.as_ref())
            .await?;

        Ok(user)
    }

    async fn get_user_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(self.pool.as_ref())
            .await?;

        Ok(user)
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .fetch_optional(self.pool.as_ref())
            .await?;

        Ok(user)
    }

    async fn update_user(&self, id: Uuid, email: &str, hashed_password: &str) -> Result<User, AppError> {
        let sql = format!(
            "UPDATE users SET email = $2, hashed_password = $3, updated_at = NOW() \
             WHERE id = $1 RETURNING {USER_COLUMNS}"
        );
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .bind(email)
            .bind(hashed_password)
            .fetch_one(self.pool.as_ref())
            .await?;

        Ok(user)
    }

    async fn upgrade_user_to_chirpy_red(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query(
            "UPDATE users SET is_chirpy_red = TRUE, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .execute(self.pool.as_ref())
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_all_users(&self) -> Result<u64, AppError> {
        let mut transaction = self.pool.as_ref().begin().await?;

        let result = sqlx::query("DELETE FROM users")
            .execute(&mut *transaction)
            .await;

        match result {
            Ok(result) => {
                transaction.commit().await?;
                Ok(result.rows_affected())
            }
            Err(e) => {
                transaction.rollback().await?;
                Err(e.into())
            }
        }
    }

    async fn create_chirp(&self, chirp: Chirp) -> Result<Chirp, AppError> {
        let sql = format!(
            "INSERT INTO chirps ({CHIRP_COLUMNS}) VALUES ($1, $2, $3, $4, $5) RETURNING {CHIRP_COLUMNS}"
        );
        let chirp = sqlx::query_as::<_, Chirp>(&sql)
            .bind(chirp.id)
            .bind(chirp.created_at)
            .bind(chirp.updated_at)
            .bind(&chirp.body)
            .bind(chirp.user_id)
            .fetch_one(self.pool.as_ref())
            .await?;

        Ok(chirp)
    }

    async fn list_chirps(&self, author_id: Option<Uuid>, order: SortOrder) -> Result<Vec<Chirp>, AppError> {
        // `order` only ever renders one of two fixed keywords
        let sql = format!(
            "SELECT {CHIRP_COLUMNS} FROM chirps \
             WHERE ($1::uuid IS NULL OR user_id = $1) \
             ORDER BY created_at {}",
            order.as_sql()
        );
        let chirps = sqlx::query_as::<_, Chirp>(&sql)
            .bind(author_id)
            .fetch_all(self.pool.as_ref())
            .await?;

        Ok(chirps)
    }

    async fn get_chirp(&self, id: Uuid) -> Result<Option<Chirp>, AppError> {
        let sql = format!("SELECT {CHIRP_COLUMNS} FROM chirps WHERE id = $1");
        let chirp = sqlx::query_as::<_, Chirp>(&sql)
            .bind(id)
            .fetch_optional(self.pool.as_ref())
            .await?;

        Ok(chirp)
    }

    async fn delete_chirp(&self, id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM chirps WHERE id = $1")
            .bind(id)
            .execute(self.pool.as_ref())
            .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound.into());
        }
        Ok(())
    }

    async fn create_refresh_token(&self, token: RefreshToken) -> Result<RefreshToken, AppError> {
        let sql = format!(
            "INSERT INTO refresh_tokens ({REFRESH_TOKEN_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {REFRESH_TOKEN_COLUMNS}"
        );
        let token = sqlx::query_as::<_, RefreshToken>(&sql)
            .bind(&token.token)
            .bind(token.created_at)
            .bind(token.updated_at)
            .bind(token.user_id)
            .bind(token.expires_at)
            .bind(token.revoked_at)
            .fetch_one(self.pool.as_ref())
            .await?;

        Ok(token)
    }

    async fn get_refresh_token(&self, token: &str) -> Result<Option<RefreshToken>, AppError> {
        let sql = format!("SELECT {REFRESH_TOKEN_COLUMNS} FROM refresh_tokens WHERE token = $1");
        let token = sqlx::query_as::<_, RefreshToken>(&sql)
            .bind(token)
            .fetch_optional(self.pool.as_ref())
            .await?;

        Ok(token)
    }

    async fn revoke_refresh_token(&self, token: &str, at: DateTime<Utc>) -> Result<(), AppError> {
        // The IS NULL guard keeps the first revocation timestamp under concurrent revokes
        let result = sqlx::query(
            "UPDATE refresh_tokens SET revoked_at = $2, updated_at = $2 \
             WHERE token = $1 AND revoked_at IS NULL",
        )
        .bind(token)
        .bind(at)
        .execute(self.pool.as_ref())
        .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound.into());
        }
        Ok(())
    }
}
