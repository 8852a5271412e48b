use std::sync::Arc;

use chrono::Utc;

use crate::auth::token::{TokenIssuer, TokenKind};
use crate::error::{AppError, AppResult};
use crate::models::session::{RenewedAccessToken, Session, SessionState};
use crate::repositories::SessionRepository;

/// Server-side session records backing refresh tokens.
///
/// A session is `Active` until it is revoked or observed past its expiry;
/// both end states are terminal. Expiry is detected when the session is next
/// used, never by a background sweep.
#[derive(Clone)]
pub struct SessionService {
    repo: Arc<dyn SessionRepository>,
    tokens: Arc<TokenIssuer>,
}

impl SessionService {
    pub fn new(repo: Arc<dyn SessionRepository>, tokens: Arc<TokenIssuer>) -> Self {
        Self { repo, tokens }
    }

    pub async fn create_session(&self, session: &Session) -> AppResult<Session> {
        self.repo.create(session).await
    }

    pub async fn get_session(&self, id: &str) -> AppResult<Session> {
        self.repo.get(id).await?.ok_or(AppError::NotFound("session"))
    }

    /// Idempotent: revoking an already revoked session succeeds.
    pub async fn revoke_session(&self, id: &str) -> AppResult<()> {
        if !self.repo.revoke(id).await? {
            return Err(AppError::NotFound("session"));
        }
        tracing::info!(session_id = %id, "session revoked");
        Ok(())
    }

    pub async fn delete_session(&self, id: &str) -> AppResult<()> {
        if !self.repo.delete(id).await? {
            return Err(AppError::NotFound("session"));
        }
        tracing::info!(session_id = %id, "session deleted");
        Ok(())
    }

    /// Revoke every session opened under `email`. Returns how many were active.
    pub async fn revoke_user_sessions(&self, email: &str) -> AppResult<u64> {
        let revoked = self.repo.revoke_for_user(email).await?;
        if revoked > 0 {
            tracing::info!(count = revoked, "user sessions revoked");
        }
        Ok(revoked)
    }

    /// Mint a new access token from a bearer session token.
    ///
    /// The token must validate, its session must exist and belong to the
    /// token's subject, and the session must be neither revoked nor expired.
    /// An expired session is revoked on the spot.
    pub async fn refresh_access_token(&self, refresh_token: &str) -> AppResult<RenewedAccessToken> {
        let claims = self.tokens.validate(refresh_token, TokenKind::Session)?;

        let session = match self.repo.get(&claims.jti).await? {
            Some(session) => session,
            None => return Err(AppError::InvalidCredentials),
        };

        if claims.sub != session.user_email {
            tracing::warn!(session_id = %session.id, "token subject does not match session owner");
            return Err(AppError::InvalidCredentials);
        }

        match session.state(Utc::now()) {
            SessionState::Revoked => return Err(AppError::SessionRevoked),
            SessionState::Expired => {
                self.repo.revoke(&session.id).await?;
                tracing::info!(session_id = %session.id, "expired session revoked on refresh");
                return Err(AppError::SessionExpired);
            }
            SessionState::Active => {}
        }

        let (access_claims, access_token) = self.tokens.issue(
            claims.subject(),
            TokenKind::Access,
            self.tokens.config().access_token_ttl(),
        )?;

        Ok(RenewedAccessToken {
            access_token,
            access_token_expires_at: access_claims.expires_at(),
        })
    }

    /// Revoke the session named by a bearer session token.
    pub async fn revoke_by_token(&self, session_token: &str) -> AppResult<()> {
        let claims = self.tokens.validate(session_token, TokenKind::Session)?;
        self.revoke_session(&claims.jti)
            .await
            .map_err(not_found_as_unauthorized)
    }

    /// Delete the session named by a bearer session token.
    pub async fn logout(&self, session_token: &str) -> AppResult<()> {
        let claims = self.tokens.validate(session_token, TokenKind::Session)?;
        self.delete_session(&claims.jti)
            .await
            .map_err(not_found_as_unauthorized)
    }
}

fn not_found_as_unauthorized(err: AppError) -> AppError {
    match err {
        AppError::NotFound(_) => AppError::InvalidCredentials,
        other => other,
    }
}
