//! Credentials repository for database operations

use sqlx::{Pool, Sqlite};

use crate::error::AppResult;

#[derive(Clone)]
pub struct CredentialsRepository {
    pool: Pool<Sqlite>,
}

impl CredentialsRepository {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    /// Stored password hash for a login
    pub async fn get_hash(&self, login: &str) -> AppResult<Option<String>> {
        let hash = sqlx::query_scalar::<_, String>("SELECT password_hash FROM credentials WHERE login = ?")
            .bind(login)
            .fetch_optional(&self.pool)
            .await?;
        Ok(hash)
    }

    /// Create or replace the hash for a login
    pub async fn upsert(&self, login: &str, password_hash: &str) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO credentials (login, password_hash) VALUES (?, ?)
            ON CONFLICT(login) DO UPDATE SET password_hash = excluded.password_hash
            "#,
        )
        .bind(login)
        .bind(password_hash)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn count(&self) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM credentials")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
