use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Json,
};
use serde::Deserialize;

use crate::{
    cache::{self, book_key, BOOK_TTL_SECS},
    error::AppError,
    models::book::{Book, CreateBook, UpdateBook},
    services::books::{parse_book_id, parse_page},
    AppState,
};

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
}

pub async fn create_book(
    State(state): State<AppState>,
    payload: Result<Json<CreateBook>, JsonRejection>,
) -> Result<(StatusCode, Json<Book>), AppError> {
    let Json(payload) = payload?;
    let book = state.books.create_book(payload).await?;
    Ok((StatusCode::CREATED, Json(book)))
}

pub async fn list_books(
    State(state): State<AppState>,
    query: Result<Query<PageQuery>, QueryRejection>,
) -> Result<Json<Vec<Book>>, AppError> {
    let Query(query) = query?;
    let page = parse_page(query.page.as_deref())?;
    let books = state.books.get_all_books(page).await?;
    Ok(Json(books))
}

pub async fn get_book(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Book>, AppError> {
    let id = parse_book_id(&id)?;
    let key = book_key(id);

    if let Some(book) = cache::get_json::<Book>(state.cache.as_ref(), &key).await {
        return Ok(Json(book));
    }

    let book = state.books.get_book_by_id(id).await?;
    cache::put_json(state.cache.as_ref(), &key, &book, BOOK_TTL_SECS).await;
    Ok(Json(book))
}

pub async fn update_book(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateBook>, JsonRejection>,
) -> Result<Json<Book>, AppError> {
    let id = parse_book_id(&id)?;
    let Json(changes) = payload?;

    let book = state.books.update_book(id, changes).await?;
    cache::put_json(state.cache.as_ref(), &book_key(id), &book, BOOK_TTL_SECS).await;
    Ok(Json(book))
}

pub async fn delete_book(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let id = parse_book_id(&id)?;
    state.books.delete_book(id).await?;
    cache::invalidate(state.cache.as_ref(), &book_key(id)).await;
    Ok(StatusCode::NO_CONTENT)
}
