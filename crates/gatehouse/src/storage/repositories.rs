// Repository layer for database operations

use anyhow::Result;
use sqlx::PgPool;
use uuid::Uuid;

use super::models::{CreateUserRow, UserRow};

#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Create database connection from URL and apply pending migrations.
    pub async fn from_url(database_url: &str) -> Result<Self> {
        let pool = PgPool::connect(database_url).await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }

    pub async fn create_user(&self, input: CreateUserRow) -> Result<UserRow> {
        let id = Uuid::now_v7();
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (id, email, password_hash, confirmed, twitter_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, email, password_hash, confirmed, forgot_password_locked, twitter_id, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(&input.email)
        .bind(&input.password_hash)
        .bind(input.confirmed)
        .bind(&input.twitter_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    pub async fn get_user(&self, id: Uuid) -> Result<Option<UserRow>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, email, password_hash, confirmed, forgot_password_locked, twitter_id, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    /// Look up a user by email. The column is not unique; the oldest row wins
    /// so repeated lookups stay deterministic.
    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<UserRow>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, email, password_hash, confirmed, forgot_password_locked, twitter_id, created_at, updated_at
            FROM users
            WHERE email = $1
            ORDER BY created_at ASC
            LIMIT 1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    pub async fn get_user_by_twitter_id(&self, twitter_id: &str) -> Result<Option<UserRow>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, email, password_hash, confirmed, forgot_password_locked, twitter_id, created_at, updated_at
            FROM users
            WHERE twitter_id = $1
            ORDER BY created_at ASC
            LIMIT 1
            "#,
        )
        .bind(twitter_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    pub async fn list_users(&self) -> Result<Vec<UserRow>> {
        let rows = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, email, password_hash, confirmed, forgot_password_locked, twitter_id, created_at, updated_at
            FROM users
            ORDER BY created_at ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Attach an external provider id to an existing account (the merge step
    /// of OAuth reconciliation).
    pub async fn set_user_twitter_id(
        &self,
        id: Uuid,
        twitter_id: &str,
    ) -> Result<Option<UserRow>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            UPDATE users
            SET twitter_id = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING id, email, password_hash, confirmed, forgot_password_locked, twitter_id, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(twitter_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    /// Mark an account's email as confirmed. Monotonic: never flips back.
    pub async fn set_user_confirmed(&self, id: Uuid) -> Result<Option<UserRow>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            UPDATE users
            SET confirmed = TRUE, updated_at = NOW()
            WHERE id = $1
            RETURNING id, email, password_hash, confirmed, forgot_password_locked, twitter_id, created_at, updated_at
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }
}
