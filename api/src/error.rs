use axum::{
    body::Body,
    extract::rejection::{JsonRejection, QueryRejection},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0} not found")]
    NotFound(&'static str),

    /// Covers every token and credential check so callers cannot tell which one failed.
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("revoked session")]
    SessionRevoked,

    #[error("session is expired")]
    SessionExpired,

    #[error("crypto error: {0}")]
    Crypto(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("{context}: {source}")]
    Persistence {
        context: &'static str,
        #[source]
        source: sqlx::Error,
    },

    #[error("password hashing error: {0}")]
    PasswordHash(argon2::password_hash::Error),

    #[error("token error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),
}

impl AppError {
    pub fn validation(msg: impl Into<String>) -> Self {
        AppError::Validation(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        AppError::Conflict(msg.into())
    }
}

/// Wraps a driver error with the name of the repository operation that failed.
pub fn persistence(context: &'static str) -> impl FnOnce(sqlx::Error) -> AppError {
    move |source| AppError::Persistence { context, source }
}

impl From<argon2::password_hash::Error> for AppError {
    fn from(inner: argon2::password_hash::Error) -> Self {
        AppError::PasswordHash(inner)
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::debug!("rejected request body: {}", rejection.body_text());
        AppError::validation("invalid request body")
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        tracing::debug!("rejected query string: {}", rejection.body_text());
        AppError::validation("invalid query string")
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            AppError::NotFound(entity) => (StatusCode::NOT_FOUND, format!("{entity} not found")),
            AppError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                "invalid credentials".to_string(),
            ),
            AppError::SessionRevoked => (StatusCode::UNAUTHORIZED, "revoked session".to_string()),
            AppError::SessionExpired => (
                StatusCode::UNAUTHORIZED,
                "session is expired".to_string(),
            ),
            AppError::Persistence { context, source } => {
                // Check for unique constraint violation
                if let Some(db_err) = source.as_database_error() {
                    if db_err.is_unique_violation() {
                        return (
                            StatusCode::CONFLICT,
                            Json(json!({"error": "resource already exists"})),
                        )
                            .into_response();
                    }
                }
                tracing::error!(error = %source, "{}", context);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                )
            }
            other => {
                tracing::error!(error = %other, "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

/// Give bodiless error responses from middleware and routing (timeouts,
/// unsupported methods) the same `{"error": ...}` body as handler errors.
pub async fn json_error_body(response: Response) -> Response {
    let status = response.status();
    let is_error = status.is_client_error() || status.is_server_error();
    if !is_error || response.headers().contains_key(header::CONTENT_TYPE) {
        return response;
    }

    let message = status
        .canonical_reason()
        .unwrap_or("request failed")
        .to_lowercase();
    let (mut parts, _) = response.into_parts();
    parts.headers.remove(header::CONTENT_LENGTH);
    parts.headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    Response::from_parts(parts, Body::from(json!({ "error": message }).to_string()))
}
