//! User identity repository.
//!
//! Only identity lookup lives here; credential checks belong to the auth
//! collaborator.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use notebase_core::{Error, Result, User, UserRepository};

/// PostgreSQL implementation of [`UserRepository`].
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    /// Create a new PgUserRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn insert(&self, username: &str) -> Result<User> {
        let user = User {
            id: Uuid::new_v4(),
            username: username.to_string(),
            created_at_utc: Utc::now(),
        };

        sqlx::query("INSERT INTO app_user (id, username, created_at_utc) VALUES ($1, $2, $3)")
            .bind(user.id)
            .bind(&user.username)
            .bind(user.created_at_utc)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;

        Ok(user)
    }

    async fn fetch(&self, id: Uuid) -> Result<Option<User>> {
        let user: Option<User> =
            sqlx::query_as("SELECT id, username, created_at_utc FROM app_user WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(Error::Database)?;

        Ok(user)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        let user: Option<User> =
            sqlx::query_as("SELECT id, username, created_at_utc FROM app_user WHERE username = $1")
                .bind(username)
                .fetch_optional(&self.pool)
                .await
                .map_err(Error::Database)?;

        Ok(user)
    }
}
