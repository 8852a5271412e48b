#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Method, Request, Response, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use sqlx::SqlitePool;
use tower::ServiceExt;

use bookstore::auth::token::TokenConfig;
use bookstore::cache::{CacheError, ResponseCache};
use bookstore::config::Config;
use bookstore::{rest, AppState};

/// Base64 of a 32-byte AES key.
pub const TEST_AES_KEY: &str = "MDEyMzQ1Njc4OWFiY2RlZjAxMjM0NTY3ODlhYmNkZWY=";

pub fn test_token_config() -> TokenConfig {
    TokenConfig {
        secret: "test-secret-that-is-long-enough-for-hmac".to_string(),
        issuer: "bookstore-test".to_string(),
        access_token_ttl_mins: 15,
        session_ttl_hours: 24,
    }
}

pub fn test_config() -> Config {
    Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        database_url: "sqlite::memory:".to_string(),
        cache_addr: "127.0.0.1:6379".to_string(),
        cipher_key: TEST_AES_KEY.to_string(),
        request_timeout_secs: 30,
        token: test_token_config(),
    }
}

/// In-process stand-in for Redis.
#[derive(Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryCache {
    pub fn peek(&self, key: &str) -> Option<String> {
        self.entries.lock().unwrap().get(key).cloned()
    }

    pub fn insert(&self, key: &str, value: &str) {
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
    }
}

#[async_trait]
impl ResponseCache for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        Ok(self.peek(key))
    }

    async fn set(&self, key: &str, value: &str, _ttl_secs: u64) -> Result<(), CacheError> {
        self.insert(key, value);
        Ok(())
    }

    async fn del(&self, key: &str) -> Result<(), CacheError> {
        self.entries.lock().unwrap().remove(key);
        Ok(())
    }
}

/// Cache whose every call fails, as if Redis went away mid-flight.
pub struct FailingCache;

#[async_trait]
impl ResponseCache for FailingCache {
    async fn get(&self, _key: &str) -> Result<Option<String>, CacheError> {
        Err(CacheError::Unavailable("connection refused".into()))
    }

    async fn set(&self, _key: &str, _value: &str, _ttl_secs: u64) -> Result<(), CacheError> {
        Err(CacheError::Unavailable("connection refused".into()))
    }

    async fn del(&self, _key: &str) -> Result<(), CacheError> {
        Err(CacheError::Unavailable("connection refused".into()))
    }
}

pub fn build_state(pool: SqlitePool, cache: Arc<dyn ResponseCache>) -> AppState {
    AppState::new(pool, cache, &test_config()).expect("test state should build")
}

/// Full router over `pool` with an inspectable in-memory cache.
pub fn build_test_app(pool: SqlitePool) -> (Router, Arc<MemoryCache>) {
    let cache = Arc::new(MemoryCache::default());
    let app = build_test_app_with_cache(pool, cache.clone());
    (app, cache)
}

pub fn build_test_app_with_cache(pool: SqlitePool, cache: Arc<dyn ResponseCache>) -> Router {
    rest::router(build_state(pool, cache), Duration::from_secs(30))
}

pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    body: Option<serde_json::Value>,
    bearer: Option<&str>,
) -> Response<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = bearer {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let body = match body {
        Some(json) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };
    app.clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap()
}

pub async fn get(app: &Router, uri: &str) -> Response<Body> {
    send(app, Method::GET, uri, None, None).await
}

pub async fn post_json(app: &Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    send(app, Method::POST, uri, Some(body), None).await
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).expect("response body should be JSON")
}

/// Assert the status and the `{"error": ...}` body shape, returning the message.
pub async fn expect_error(response: Response<Body>, status: StatusCode) -> String {
    assert_eq!(response.status(), status);
    let json = body_json(response).await;
    let obj = json.as_object().expect("error body should be an object");
    assert_eq!(obj.len(), 1, "error body should only carry `error`: {json}");
    json["error"].as_str().unwrap().to_string()
}
