//! Best-effort response cache.
//!
//! Callers treat every cache failure as a miss: errors are logged and the
//! request falls through to the store.

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use serde::{de::DeserializeOwned, Serialize};

/// Lifetime of a cached book, in seconds.
pub const BOOK_TTL_SECS: u64 = 3600;

pub fn book_key(id: i64) -> String {
    format!("book{id}")
}

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("cache serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("cache unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait ResponseCache: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    async fn set(&self, key: &str, value: &str, ttl_secs: u64) -> Result<(), CacheError>;

    async fn del(&self, key: &str) -> Result<(), CacheError>;
}

/// Read a JSON value. Misses, failures and undecodable entries all return
/// `None`; an undecodable entry is also removed.
pub async fn get_json<T: DeserializeOwned>(cache: &dyn ResponseCache, key: &str) -> Option<T> {
    let raw = match cache.get(key).await {
        Ok(Some(raw)) => raw,
        Ok(None) => {
            tracing::debug!(key = %key, "cache miss");
            return None;
        }
        Err(e) => {
            tracing::warn!(key = %key, error = %e, "cache read failed");
            return None;
        }
    };

    match serde_json::from_str(&raw) {
        Ok(value) => {
            tracing::debug!(key = %key, "cache hit");
            Some(value)
        }
        Err(e) => {
            tracing::warn!(key = %key, error = %e, "discarding undecodable cache entry");
            invalidate(cache, key).await;
            None
        }
    }
}

/// Store a JSON value, logging instead of failing.
pub async fn put_json<T: Serialize>(cache: &dyn ResponseCache, key: &str, value: &T, ttl_secs: u64) {
    let result = match serde_json::to_string(value) {
        Ok(raw) => cache.set(key, &raw, ttl_secs).await,
        Err(e) => Err(e.into()),
    };
    if let Err(e) = result {
        tracing::warn!(key = %key, error = %e, "failed to cache data");
    }
}

/// Remove a key, logging instead of failing.
pub async fn invalidate(cache: &dyn ResponseCache, key: &str) {
    if let Err(e) = cache.del(key).await {
        tracing::warn!(key = %key, error = %e, "failed to invalidate cache entry");
    }
}

#[derive(Clone)]
pub struct RedisCache {
    conn: ConnectionManager,
}

impl RedisCache {
    /// Connect to `addr`, which may be a full `redis://` URL or a bare `host:port`.
    pub async fn connect(addr: &str) -> Result<Self, CacheError> {
        let url = if addr.contains("://") {
            addr.to_string()
        } else {
            format!("redis://{addr}")
        };
        let client = redis::Client::open(url)?;
        let conn = client.get_connection_manager().await?;
        tracing::info!("connected to redis at {}", addr);
        Ok(Self { conn })
    }
}

#[async_trait]
impl ResponseCache for RedisCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut conn = self.conn.clone();
        Ok(conn.get(key).await?)
    }

    async fn set(&self, key: &str, value: &str, ttl_secs: u64) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        conn.set_ex::<_, _, ()>(key, value, ttl_secs).await?;
        Ok(())
    }

    async fn del(&self, key: &str) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        conn.del::<_, ()>(key).await?;
        Ok(())
    }
}

/// Stand-in used when Redis is unreachable at startup: every read misses and
/// writes are dropped.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledCache;

#[async_trait]
impl ResponseCache for DisabledCache {
    async fn get(&self, _key: &str) -> Result<Option<String>, CacheError> {
        Ok(None)
    }

    async fn set(&self, _key: &str, _value: &str, _ttl_secs: u64) -> Result<(), CacheError> {
        Ok(())
    }

    async fn del(&self, _key: &str) -> Result<(), CacheError> {
        Ok(())
    }
}
