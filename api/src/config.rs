use std::str::FromStr;

use crate::auth::token::TokenConfig;
use crate::error::AppError;

/// One day.
pub const MAX_ACCESS_TOKEN_TTL_MINS: i64 = 24 * 60;
/// One year.
pub const MAX_SESSION_TTL_HOURS: i64 = 365 * 24;

/// Service configuration, read once from the environment at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `8080`).
    pub port: u16,
    pub database_url: String,
    /// Redis address, `host:port` or a `redis://` URL.
    pub cache_addr: String,
    /// Base64-encoded AES key for the cover image field.
    pub cipher_key: String,
    pub request_timeout_secs: u64,
    pub token: TokenConfig,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// | Env Var                 | Required | Default          |
    /// |-------------------------|----------|------------------|
    /// | `DATABASE_URL`          | yes      | --               |
    /// | `AES_KEY`               | yes      | --               |
    /// | `JWT_SECRET`            | yes      | --               |
    /// | `ISSUER`                | yes      | --               |
    /// | `REDIS_ADDR`            | no       | `127.0.0.1:6379` |
    /// | `HOST`                  | no       | `0.0.0.0`        |
    /// | `PORT`                  | no       | `8080`           |
    /// | `REQUEST_TIMEOUT_SECS`  | no       | `30`             |
    /// | `ACCESS_TOKEN_TTL_MINS` | no       | `15` (1..=1440)  |
    /// | `SESSION_TTL_HOURS`     | no       | `24` (1..=8760)  |
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .filter(|value| !value.trim().is_empty())
                .ok_or_else(|| AppError::Config(format!("{key} must be set")))
        };

        let token = TokenConfig {
            secret: required("JWT_SECRET")?,
            issuer: required("ISSUER")?,
            access_token_ttl_mins: parse_ttl(
                &lookup,
                "ACCESS_TOKEN_TTL_MINS",
                15,
                MAX_ACCESS_TOKEN_TTL_MINS,
            )?,
            session_ttl_hours: parse_ttl(&lookup, "SESSION_TTL_HOURS", 24, MAX_SESSION_TTL_HOURS)?,
        };

        Ok(Self {
            host: lookup("HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port: parse_or(&lookup, "PORT", 8080)?,
            database_url: required("DATABASE_URL")?,
            cache_addr: lookup("REDIS_ADDR").unwrap_or_else(|| "127.0.0.1:6379".into()),
            cipher_key: required("AES_KEY")?,
            request_timeout_secs: parse_or(&lookup, "REQUEST_TIMEOUT_SECS", 30)?,
            token,
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_or<T, F>(lookup: &F, key: &str, default: T) -> Result<T, AppError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| AppError::Config(format!("{key} must be a valid number"))),
        None => Ok(default),
    }
}

/// Token lifetimes must be positive and no longer than `max`.
fn parse_ttl<F>(lookup: &F, key: &str, default: i64, max: i64) -> Result<i64, AppError>
where
    F: Fn(&str) -> Option<String>,
{
    let value = parse_or(lookup, key, default)?;
    if !(1..=max).contains(&value) {
        return Err(AppError::Config(format!(
            "{key} must be between 1 and {max}, got {value}"
        )));
    }
    Ok(value)
}
