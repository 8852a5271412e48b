//! Signed, time-bound identity tokens.
//!
//! Access tokens and session (refresh) tokens are HMAC-signed JWTs with the
//! same [`Claims`] shape. The `typ` claim tells them apart and every
//! validation names the kind it expects. A session token's `jti` is the
//! primary key of its server-side session row.

use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    /// Short-lived bearer for API calls.
    Access,
    /// Long-lived, backed by a session row; only good for refresh, revoke and logout.
    Session,
}

/// Who a token speaks for.
#[derive(Debug, Clone, Copy)]
pub struct Subject<'a> {
    pub email: &'a str,
    pub user_id: i64,
    pub is_admin: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Claims {
    /// The user's email at issue time.
    pub sub: String,
    /// The user's row id. Unlike the email it never changes.
    pub uid: i64,
    #[serde(rename = "isAdmin", default)]
    pub is_admin: bool,
    pub typ: TokenKind,
    pub iss: String,
    /// Unique token id; doubles as the session id for session tokens.
    pub jti: String,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    pub fn subject(&self) -> Subject<'_> {
        Subject {
            email: &self.sub,
            user_id: self.uid,
            is_admin: self.is_admin,
        }
    }

    pub fn issued_at(&self) -> DateTime<Utc> {
        Utc.timestamp_opt(self.iat, 0).single().unwrap_or_default()
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        Utc.timestamp_opt(self.exp, 0).single().unwrap_or_default()
    }
}

#[derive(Debug, Clone)]
pub struct TokenConfig {
    /// HMAC secret used to sign and verify tokens.
    pub secret: String,
    /// Expected `iss` claim.
    pub issuer: String,
    pub access_token_ttl_mins: i64,
    pub session_ttl_hours: i64,
}

impl TokenConfig {
    pub fn access_token_ttl(&self) -> Duration {
        Duration::minutes(self.access_token_ttl_mins)
    }

    pub fn session_ttl(&self) -> Duration {
        Duration::hours(self.session_ttl_hours)
    }
}

#[derive(Clone)]
pub struct TokenIssuer {
    config: TokenConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenIssuer {
    pub fn new(config: TokenConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());

        let mut validation = Validation::new(Algorithm::HS256);
        validation.algorithms = vec![Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];
        validation.set_issuer(&[config.issuer.as_str()]);
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);
        validation.leeway = 0;

        Self {
            config,
            encoding_key,
            decoding_key,
            validation,
        }
    }

    pub fn config(&self) -> &TokenConfig {
        &self.config
    }

    fn is_configured(&self) -> bool {
        !self.config.secret.is_empty() && !self.config.issuer.is_empty()
    }

    /// Issue a `kind` token for `subject` valid for `duration` from now.
    pub fn issue(
        &self,
        subject: Subject<'_>,
        kind: TokenKind,
        duration: Duration,
    ) -> Result<(Claims, String), AppError> {
        if !self.is_configured() {
            return Err(AppError::Config(
                "token signing secret and issuer must be set".into(),
            ));
        }

        let now = Utc::now();
        let expires_at = now
            .checked_add_signed(duration)
            .ok_or_else(|| AppError::Config("token lifetime is out of range".into()))?;
        let claims = Claims {
            sub: subject.email.to_string(),
            uid: subject.user_id,
            is_admin: subject.is_admin,
            typ: kind,
            iss: self.config.issuer.clone(),
            jti: Uuid::new_v4().to_string(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)?;
        Ok((claims, token))
    }

    /// Verify signature, algorithm family, issuer, expiry and token kind.
    ///
    /// Every failure collapses into [`AppError::InvalidCredentials`].
    pub fn validate(&self, token: &str, kind: TokenKind) -> Result<Claims, AppError> {
        if !self.is_configured() {
            return Err(AppError::InvalidCredentials);
        }

        let claims = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!("token rejected: {}", e);
                AppError::InvalidCredentials
            })?;

        if claims.typ != kind {
            tracing::debug!(expected = ?kind, got = ?claims.typ, "token kind mismatch");
            return Err(AppError::InvalidCredentials);
        }
        Ok(claims)
    }
}
