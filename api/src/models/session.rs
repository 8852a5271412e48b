use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Session {
    /// Id claim of the session token.
    pub id: String,
    pub user_email: String,
    pub refresh_token: String,
    pub is_revoked: bool,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Active,
    Revoked,
    Expired,
}

impl Session {
    /// Revocation wins over expiry; both are terminal.
    pub fn state(&self, now: DateTime<Utc>) -> SessionState {
        if self.is_revoked {
            SessionState::Revoked
        } else if self.expires_at <= now {
            SessionState::Expired
        } else {
            SessionState::Active
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RenewedAccessToken {
    pub access_token: String,
    pub access_token_expires_at: DateTime<Utc>,
}
