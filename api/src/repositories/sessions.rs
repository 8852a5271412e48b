use async_trait::async_trait;
use sqlx::SqlitePool;

use crate::error::{persistence, AppResult};
use crate::models::session::Session;

const SESSION_COLUMNS: &str = "id, user_email, refresh_token, is_revoked, created_at, expires_at";

#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Fails on a duplicate id.
    async fn create(&self, session: &Session) -> AppResult<Session>;

    async fn get(&self, id: &str) -> AppResult<Option<Session>>;

    /// Returns `false` when no session has this id. Revoking a revoked session
    /// still matches the row and returns `true`.
    async fn revoke(&self, id: &str) -> AppResult<bool>;

    /// Revoke all active sessions of a user, returning how many changed.
    async fn revoke_for_user(&self, user_email: &str) -> AppResult<u64>;

    /// Returns `false` when no session has this id.
    async fn delete(&self, id: &str) -> AppResult<bool>;
}

#[derive(Clone)]
pub struct SqliteSessionRepository {
    pool: SqlitePool,
}

impl SqliteSessionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionRepository for SqliteSessionRepository {
    async fn create(&self, session: &Session) -> AppResult<Session> {
        sqlx::query_as::<_, Session>(&format!(
            "INSERT INTO sessions (id, user_email, refresh_token, is_revoked, created_at, expires_at) \
             VALUES (?, ?, ?, ?, ?, ?) \
             RETURNING {SESSION_COLUMNS}"
        ))
        .bind(&session.id)
        .bind(&session.user_email)
        .bind(&session.refresh_token)
        .bind(session.is_revoked)
        .bind(session.created_at)
        .bind(session.expires_at)
        .fetch_one(&self.pool)
        .await
        .map_err(persistence("error creating session"))
    }

    async fn get(&self, id: &str) -> AppResult<Option<Session>> {
        sqlx::query_as::<_, Session>(&format!(
            "SELECT {SESSION_COLUMNS} FROM sessions WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(persistence("error getting session"))
    }

    async fn revoke(&self, id: &str) -> AppResult<bool> {
        let result = sqlx::query("UPDATE sessions SET is_revoked = 1 WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(persistence("error revoking session"))?;
        Ok(result.rows_affected() > 0)
    }

    async fn revoke_for_user(&self, user_email: &str) -> AppResult<u64> {
        let result =
            sqlx::query("UPDATE sessions SET is_revoked = 1 WHERE user_email = ? AND is_revoked = 0")
                .bind(user_email)
                .execute(&self.pool)
                .await
                .map_err(persistence("error revoking user sessions"))?;
        Ok(result.rows_affected())
    }

    async fn delete(&self, id: &str) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM sessions WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(persistence("error deleting session"))?;
        Ok(result.rows_affected() > 0)
    }
}
