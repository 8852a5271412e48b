use std::sync::Arc;

use chrono::Utc;

use crate::auth::password::{hash_password, validate_email, validate_password, verify_password};
use crate::auth::token::{Claims, Subject, TokenIssuer, TokenKind};
use crate::error::{AppError, AppResult};
use crate::models::session::Session;
use crate::models::user::{
    AuthResponse, CreateUser, LoginPayload, NewUser, UpdateUser, UserResponse,
};
use crate::repositories::UserRepository;
use crate::services::SessionService;

#[derive(Clone)]
pub struct UserService {
    repo: Arc<dyn UserRepository>,
    sessions: SessionService,
    tokens: Arc<TokenIssuer>,
}

impl UserService {
    pub fn new(
        repo: Arc<dyn UserRepository>,
        sessions: SessionService,
        tokens: Arc<TokenIssuer>,
    ) -> Self {
        Self {
            repo,
            sessions,
            tokens,
        }
    }

    pub async fn register(&self, payload: CreateUser) -> AppResult<UserResponse> {
        let name = payload.name.trim();
        if name.is_empty() {
            return Err(AppError::validation("name must not be empty"));
        }
        validate_email(&payload.email)?;
        validate_password(&payload.password)?;

        let new_user = NewUser {
            name: name.to_string(),
            email: payload.email,
            password_hash: hash_password(&payload.password)?,
        };

        let user = self
            .repo
            .register(&new_user)
            .await?
            .ok_or_else(|| AppError::conflict("email already exists"))?;

        tracing::info!(user_id = user.id, "user registered");
        Ok(user.into())
    }

    /// Check credentials, open a session and hand out an access/session token pair.
    ///
    /// An unknown email and a wrong password both yield
    /// [`AppError::InvalidCredentials`].
    pub async fn login(&self, payload: LoginPayload) -> AppResult<AuthResponse> {
        validate_email(&payload.email).map_err(|_| AppError::InvalidCredentials)?;

        let user = self
            .repo
            .get_by_email(&payload.email)
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        if !verify_password(&payload.password, &user.password_hash)? {
            return Err(AppError::InvalidCredentials);
        }

        let config = self.tokens.config();
        let subject = Subject {
            email: &user.email,
            user_id: user.id,
            is_admin: user.is_admin,
        };
        let (access_claims, access_token) =
            self.tokens
                .issue(subject, TokenKind::Access, config.access_token_ttl())?;
        let (session_claims, session_token) =
            self.tokens
                .issue(subject, TokenKind::Session, config.session_ttl())?;

        let session = self
            .sessions
            .create_session(&Session {
                id: session_claims.jti.clone(),
                user_email: user.email.clone(),
                refresh_token: session_token.clone(),
                is_revoked: false,
                created_at: session_claims.issued_at(),
                expires_at: session_claims.expires_at(),
            })
            .await?;

        tracing::info!(user_id = user.id, session_id = %session.id, "user logged in");

        Ok(AuthResponse {
            user: user.into(),
            session_id: session.id,
            access_token,
            access_token_expires_at: access_claims.expires_at(),
            refresh_token: session_token,
            refresh_token_expires_at: session.expires_at,
        })
    }

    /// Apply a partial profile update to the user named by the token claims.
    ///
    /// The acting identity always comes from the `uid` claim, never from the
    /// payload. Changing the email revokes the sessions opened under the old one.
    pub async fn update_user(&self, claims: &Claims, changes: UpdateUser) -> AppResult<UserResponse> {
        if changes.is_empty() {
            return Err(AppError::validation("nothing to update"));
        }
        if let Some(name) = &changes.name {
            if name.trim().is_empty() {
                return Err(AppError::validation("name must not be empty"));
            }
        }
        if let Some(email) = &changes.email {
            validate_email(email)?;
        }
        if let Some(password) = &changes.password {
            validate_password(password)?;
        }

        let mut user = self
            .repo
            .get_by_id(claims.uid)
            .await?
            .ok_or(AppError::InvalidCredentials)?;
        let previous_email = user.email.clone();

        if let Some(name) = changes.name {
            user.name = name.trim().to_string();
        }
        if let Some(email) = changes.email {
            user.email = email;
        }
        if let Some(password) = changes.password {
            user.password_hash = hash_password(&password)?;
        }
        user.updated_at = Some(Utc::now());

        let updated = self
            .repo
            .update(&user)
            .await?
            .ok_or_else(|| AppError::conflict("email already exists"))?;

        if updated.email != previous_email {
            self.sessions.revoke_user_sessions(&previous_email).await?;
        }

        tracing::info!(user_id = updated.id, "user updated");
        Ok(updated.into())
    }

    pub async fn update_user_data(&self, claims: &Claims, name: String) -> AppResult<UserResponse> {
        self.update_user(
            claims,
            UpdateUser {
                name: Some(name),
                ..Default::default()
            },
        )
        .await
    }

    pub async fn update_user_email(&self, claims: &Claims, email: String) -> AppResult<UserResponse> {
        self.update_user(
            claims,
            UpdateUser {
                email: Some(email),
                ..Default::default()
            },
        )
        .await
    }

    pub async fn update_user_password(
        &self,
        claims: &Claims,
        password: String,
    ) -> AppResult<UserResponse> {
        self.update_user(
            claims,
            UpdateUser {
                password: Some(password),
                ..Default::default()
            },
        )
        .await
    }
}
