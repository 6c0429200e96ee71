use crate::models::{NewUser, User};
use crate::utils::errors::{map_unique_violation, AppError};
use chrono::Utc;
use sqlx::SqlitePool;

pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, user: NewUser) -> Result<User, AppError> {
        let now = Utc::now();

        let result = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, password_hash, admin, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?)
            RETURNING id, username, password_hash, admin, created_at, updated_at
            "#,
        )
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(user.admin)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, "User", "username", &user.username))?;

        Ok(result)
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<User>, AppError> {
        let result = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(result)
    }

    pub async fn set_admin(&self, username: &str, admin: bool) -> Result<Option<User>, AppError> {
        let result = sqlx::query_as::<_, User>(
            r#"
            UPDATE users SET admin = ?, updated_at = ?
            WHERE username = ?
            RETURNING id, username, password_hash, admin, created_at, updated_at
            "#,
        )
        .bind(admin)
        .bind(Utc::now())
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(result)
    }

    pub async fn find_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        let result = sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;

        Ok(result)
    }
}
