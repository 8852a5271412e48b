use std::sync::Arc;

use sqlx::SqlitePool;

use crate::auth::token::TokenIssuer;
use crate::cache::ResponseCache;
use crate::config::Config;
use crate::crypto::FieldCipher;
use crate::error::AppError;
use crate::repositories::{SqliteBookRepository, SqliteSessionRepository, SqliteUserRepository};
use crate::services::{BookService, SessionService, UserService};

/// Shared application state, cheap to clone into every handler.
#[derive(Clone)]
pub struct AppState {
    pub users: UserService,
    pub sessions: SessionService,
    pub books: BookService,
    pub tokens: Arc<TokenIssuer>,
    pub cache: Arc<dyn ResponseCache>,
}

impl AppState {
    /// Wire repositories and services over `pool`. Fails when the cipher key is unusable.
    pub fn new(
        pool: SqlitePool,
        cache: Arc<dyn ResponseCache>,
        config: &Config,
    ) -> Result<Self, AppError> {
        let cipher = Arc::new(FieldCipher::from_base64_key(&config.cipher_key)?);
        let tokens = Arc::new(TokenIssuer::new(config.token.clone()));

        let sessions = SessionService::new(
            Arc::new(SqliteSessionRepository::new(pool.clone())),
            tokens.clone(),
        );
        let users = UserService::new(
            Arc::new(SqliteUserRepository::new(pool.clone())),
            sessions.clone(),
            tokens.clone(),
        );
        let books = BookService::new(Arc::new(SqliteBookRepository::new(pool)), cipher);

        Ok(Self {
            users,
            sessions,
            books,
            tokens,
            cache,
        })
    }
}
