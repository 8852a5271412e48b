use async_trait::async_trait;
use sqlx::SqlitePool;

use super::is_unique_violation;
use crate::error::{persistence, AppResult};
use crate::models::user::{NewUser, User};

const USER_COLUMNS: &str = "id, name, email, password_hash, is_admin, created_at, updated_at";

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn get_by_email(&self, email: &str) -> AppResult<Option<User>>;

    async fn get_by_id(&self, id: i64) -> AppResult<Option<User>>;

    /// Inserts unless the email is taken; `None` means nothing was inserted.
    async fn register(&self, user: &NewUser) -> AppResult<Option<User>>;

    /// Writes every mutable column. `None` means the new email belongs to
    /// another user or the row no longer exists.
    async fn update(&self, user: &User) -> AppResult<Option<User>>;
}

#[derive(Clone)]
pub struct SqliteUserRepository {
    pool: SqlitePool,
}

impl SqliteUserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for SqliteUserRepository {
    async fn get_by_email(&self, email: &str) -> AppResult<Option<User>> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = ?"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(persistence("error getting user"))
    }

    async fn get_by_id(&self, id: i64) -> AppResult<Option<User>> {
        sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(persistence("error getting user"))
    }

    async fn register(&self, user: &NewUser) -> AppResult<Option<User>> {
        let result = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (name, email, password_hash, is_admin, created_at) \
             SELECT ?, ?, ?, 0, ? \
             WHERE NOT EXISTS (SELECT 1 FROM users WHERE email = ?) \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(chrono::Utc::now())
        .bind(&user.email)
        .fetch_optional(&self.pool)
        .await;

        match result {
            Ok(row) => Ok(row),
            // Lost a race with a concurrent registration of the same email.
            Err(e) if is_unique_violation(&e) => Ok(None),
            Err(e) => Err(persistence("error creating user")(e)),
        }
    }

    async fn update(&self, user: &User) -> AppResult<Option<User>> {
        let result = sqlx::query_as::<_, User>(&format!(
            "UPDATE users \
             SET name = ?, email = ?, password_hash = ?, updated_at = ? \
             WHERE id = ? AND NOT EXISTS (SELECT 1 FROM users WHERE email = ? AND id <> ?) \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.updated_at)
        .bind(user.id)
        .bind(&user.email)
        .bind(user.id)
        .fetch_optional(&self.pool)
        .await;

        match result {
            Ok(row) => Ok(row),
            Err(e) if is_unique_violation(&e) => Ok(None),
            Err(e) => Err(persistence("error updating user")(e)),
        }
    }
}
