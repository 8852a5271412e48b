//! Bearer-token extractors for axum handlers.

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::{header::AUTHORIZATION, request::Parts};

use crate::auth::token::{Claims, TokenKind};
use crate::error::AppError;
use crate::state::AppState;

/// Raw token from an `Authorization: Bearer <token>` header, not yet validated.
#[derive(Debug, Clone)]
pub struct BearerToken(pub String);

#[async_trait]
impl<S> FromRequestParts<S> for BearerToken
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(AppError::InvalidCredentials)?;

        Ok(BearerToken(token.to_string()))
    }
}

/// Caller identity taken from a validated access token. Session tokens are
/// rejected here.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub claims: Claims,
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let BearerToken(token) = BearerToken::from_request_parts(parts, state).await?;
        let claims = state.tokens.validate(&token, TokenKind::Access)?;
        Ok(AuthUser { claims })
    }
}
