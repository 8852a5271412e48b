use std::sync::{Arc, LazyLock};

use chrono::Utc;
use regex::Regex;

use crate::crypto::FieldCipher;
use crate::error::{AppError, AppResult};
use crate::models::book::{Book, BookRecord, CreateBook, UpdateBook};
use crate::repositories::BookRepository;
use crate::slug::slugify;

static PAGE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[1-9]\d*$").expect("valid regex"));

/// Book catalogue operations. Cover image URLs are encrypted before they
/// reach the repository and decrypted before they leave this service.
#[derive(Clone)]
pub struct BookService {
    repo: Arc<dyn BookRepository>,
    cipher: Arc<FieldCipher>,
}

impl BookService {
    pub fn new(repo: Arc<dyn BookRepository>, cipher: Arc<FieldCipher>) -> Self {
        Self { repo, cipher }
    }

    pub async fn create_book(&self, payload: CreateBook) -> AppResult<Book> {
        let title = validated_title(&payload.title)?;
        validate_quantities(payload.price, payload.stock)?;

        let record = BookRecord {
            slug: slugify(&title),
            title,
            cover_image: self.cipher.encrypt(&payload.cover_image)?,
            synopsis: payload.synopsis,
            price: payload.price,
            stock: payload.stock,
        };

        let book = self
            .repo
            .create(&record)
            .await?
            .ok_or_else(|| AppError::conflict("book title already exists"))?;

        tracing::info!(book_id = book.id, slug = %book.slug, "book created");
        self.decrypt_book(book)
    }

    pub async fn get_book_by_id(&self, id: i64) -> AppResult<Book> {
        let book = self
            .repo
            .get_by_id(id)
            .await?
            .ok_or(AppError::NotFound("book"))?;
        self.decrypt_book(book)
    }

    pub async fn get_all_books(&self, page: u32) -> AppResult<Vec<Book>> {
        self.repo
            .list(page)
            .await?
            .into_iter()
            .map(|book| self.decrypt_book(book))
            .collect()
    }

    /// Merge `changes` into the stored book. The slug is always recomputed
    /// from the resulting title.
    pub async fn update_book(&self, id: i64, changes: UpdateBook) -> AppResult<Book> {
        let current = self
            .repo
            .get_by_id(id)
            .await?
            .ok_or(AppError::NotFound("book"))?;

        let title = match changes.title {
            Some(title) => validated_title(&title)?,
            None => current.title,
        };
        let price = changes.price.unwrap_or(current.price);
        let stock = changes.stock.unwrap_or(current.stock);
        validate_quantities(price, stock)?;

        let cover_image = match changes.cover_image {
            Some(url) => self.cipher.encrypt(&url)?,
            None => current.cover_image,
        };

        let record = BookRecord {
            slug: slugify(&title),
            title,
            cover_image,
            synopsis: changes.synopsis.unwrap_or(current.synopsis),
            price,
            stock,
        };

        let Some(book) = self.repo.update(id, &record, Utc::now()).await? else {
            // Gone since the read above, or the new title is taken.
            if self.repo.get_by_id(id).await?.is_none() {
                return Err(AppError::NotFound("book"));
            }
            return Err(AppError::conflict("book title already exists"));
        };

        tracing::info!(book_id = book.id, "book updated");
        self.decrypt_book(book)
    }

    pub async fn delete_book(&self, id: i64) -> AppResult<()> {
        if !self.repo.delete(id).await? {
            return Err(AppError::NotFound("book"));
        }
        tracing::info!(book_id = id, "book deleted");
        Ok(())
    }

    fn decrypt_book(&self, mut book: Book) -> AppResult<Book> {
        book.cover_image = self.cipher.decrypt(&book.cover_image)?;
        Ok(book)
    }
}

/// Parse a book id from a path segment.
pub fn parse_book_id(raw: &str) -> AppResult<i64> {
    match raw.parse::<i64>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(AppError::validation("invalid id")),
    }
}

/// Parse the optional `page` query parameter; absent or empty means page 1.
pub fn parse_page(raw: Option<&str>) -> AppResult<u32> {
    let raw = match raw {
        None | Some("") => return Ok(1),
        Some(raw) => raw,
    };
    if !PAGE_RE.is_match(raw) {
        return Err(AppError::validation("page not valid"));
    }
    raw.parse()
        .map_err(|_| AppError::validation("page not valid"))
}

fn validated_title(title: &str) -> AppResult<String> {
    let title = title.trim();
    if title.is_empty() {
        return Err(AppError::validation("title must not be empty"));
    }
    Ok(title.to_string())
}

fn validate_quantities(price: f64, stock: i64) -> AppResult<()> {
    if !price.is_finite() || price < 0.0 {
        return Err(AppError::validation("price must not be negative"));
    }
    if stock < 0 {
        return Err(AppError::validation("stock must not be negative"));
    }
    Ok(())
}
