use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use super::is_unique_violation;
use crate::error::{persistence, AppResult};
use crate::models::book::{Book, BookRecord};

pub const PAGE_SIZE: i64 = 20;

const BOOK_COLUMNS: &str =
    "id, title, slug, cover_image, synopsis, price, stock, created_at, updated_at";

#[async_trait]
pub trait BookRepository: Send + Sync {
    /// `None` when another book already has this title.
    async fn create(&self, book: &BookRecord) -> AppResult<Option<Book>>;

    async fn get_by_id(&self, id: i64) -> AppResult<Option<Book>>;

    /// One page of books ordered by id; `page` is 1-indexed.
    async fn list(&self, page: u32) -> AppResult<Vec<Book>>;

    /// `None` when the row is gone or the new title belongs to another book.
    async fn update(
        &self,
        id: i64,
        book: &BookRecord,
        updated_at: DateTime<Utc>,
    ) -> AppResult<Option<Book>>;

    /// Returns `false` when no book has this id.
    async fn delete(&self, id: i64) -> AppResult<bool>;
}

#[derive(Clone)]
pub struct SqliteBookRepository {
    pool: SqlitePool,
}

impl SqliteBookRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BookRepository for SqliteBookRepository {
    async fn create(&self, book: &BookRecord) -> AppResult<Option<Book>> {
        sqlx::query_as::<_, Book>(&format!(
            "INSERT INTO books (title, slug, cover_image, synopsis, price, stock, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?) \
             ON CONFLICT (title) DO NOTHING \
             RETURNING {BOOK_COLUMNS}"
        ))
        .bind(&book.title)
        .bind(&book.slug)
        .bind(&book.cover_image)
        .bind(&book.synopsis)
        .bind(book.price)
        .bind(book.stock)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await
        .map_err(persistence("error inserting book"))
    }

    async fn get_by_id(&self, id: i64) -> AppResult<Option<Book>> {
        sqlx::query_as::<_, Book>(&format!("SELECT {BOOK_COLUMNS} FROM books WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(persistence("error getting book"))
    }

    async fn list(&self, page: u32) -> AppResult<Vec<Book>> {
        let offset = PAGE_SIZE * (i64::from(page.max(1)) - 1);
        sqlx::query_as::<_, Book>(&format!(
            "SELECT {BOOK_COLUMNS} FROM books ORDER BY id LIMIT ? OFFSET ?"
        ))
        .bind(PAGE_SIZE)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(persistence("error getting books"))
    }

    async fn update(
        &self,
        id: i64,
        book: &BookRecord,
        updated_at: DateTime<Utc>,
    ) -> AppResult<Option<Book>> {
        let result = sqlx::query_as::<_, Book>(&format!(
            "UPDATE books \
             SET title = ?, slug = ?, cover_image = ?, synopsis = ?, price = ?, stock = ?, updated_at = ? \
             WHERE id = ? AND NOT EXISTS (SELECT 1 FROM books WHERE title = ? AND id <> ?) \
             RETURNING {BOOK_COLUMNS}"
        ))
        .bind(&book.title)
        .bind(&book.slug)
        .bind(&book.cover_image)
        .bind(&book.synopsis)
        .bind(book.price)
        .bind(book.stock)
        .bind(updated_at)
        .bind(id)
        .bind(&book.title)
        .bind(id)
        .fetch_optional(&self.pool)
        .await;

        match result {
            Ok(row) => Ok(row),
            Err(e) if is_unique_violation(&e) => Ok(None),
            Err(e) => Err(persistence("error updating book")(e)),
        }
    }

    async fn delete(&self, id: i64) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM books WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(persistence("error deleting book"))?;
        Ok(result.rows_affected() > 0)
    }
}
