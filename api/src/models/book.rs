use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A book row. `cover_image` holds ciphertext while at rest and plaintext
/// once the service has decrypted it.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, PartialEq)]
pub struct Book {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub cover_image: String,
    pub synopsis: String,
    pub price: f64,
    pub stock: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateBook {
    pub title: String,
    pub cover_image: String,
    #[serde(default)]
    pub synopsis: String,
    pub price: f64,
    pub stock: i64,
}

/// Partial update. `None` leaves the stored value untouched, so an explicit
/// zero price or stock is a real change.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateBook {
    pub title: Option<String>,
    pub cover_image: Option<String>,
    pub synopsis: Option<String>,
    pub price: Option<f64>,
    pub stock: Option<i64>,
}

/// Column values written by the repository; `cover_image` is already encrypted.
#[derive(Debug, Clone)]
pub struct BookRecord {
    pub title: String,
    pub slug: String,
    pub cover_image: String,
    pub synopsis: String,
    pub price: f64,
    pub stock: i64,
}
