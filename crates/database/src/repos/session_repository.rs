//! Session repository for bearer tokens.

use crate::entities::AuthSession;
use crate::timestamp_now;
use crate::types::{DatabaseError, DatabaseResult};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

#[derive(Clone)]
pub struct SessionRepository {
    pool: SqlitePool,
}

impl SessionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(
        &self,
        user_id: i64,
        token: &str,
        expires_at: &str,
    ) -> DatabaseResult<AuthSession> {
        let now = timestamp_now();
        let result = sqlx::query(
            "INSERT INTO sessions (user_id, token, created_at, expires_at) VALUES (?, ?, ?, ?)",
        )
        .bind(user_id)
        .bind(token)
        .bind(&now)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;

        Ok(AuthSession {
            id: result.last_insert_rowid(),
            user_id,
            token: token.to_string(),
            created_at: now,
            expires_at: expires_at.to_string(),
        })
    }

    pub async fn find_by_token(&self, token: &str) -> DatabaseResult<Option<AuthSession>> {
        let row = sqlx::query(
            "SELECT id, user_id, token, created_at, expires_at FROM sessions WHERE token = ?",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(session_from_row).transpose()
    }

    pub async fn delete(&self, token: &str) -> DatabaseResult<()> {
        let result = sqlx::query("DELETE FROM sessions WHERE token = ?")
            .bind(token)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound("session".to_string()));
        }

        Ok(())
    }

    pub async fn delete_for_user(&self, user_id: i64) -> DatabaseResult<u64> {
        let result = sqlx::query("DELETE FROM sessions WHERE user_id = ?")
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    /// Remove every session whose expiry is at or before `now`.
    pub async fn delete_expired(&self, now: &str) -> DatabaseResult<u64> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= ?")
            .bind(now)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}

fn session_from_row(row: &SqliteRow) -> DatabaseResult<AuthSession> {
    Ok(AuthSession {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        token: row.try_get("token")?,
        created_at: row.try_get("created_at")?,
        expires_at: row.try_get("expires_at")?,
    })
}
