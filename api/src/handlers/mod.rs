use crate::error::AppError;

pub mod auth;
pub mod books;

pub async fn health() -> &'static str {
    "ok"
}

pub async fn not_found() -> AppError {
    AppError::NotFound("route")
}
