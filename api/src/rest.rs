use std::time::Duration;

use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::error::json_error_body;
use crate::handlers::{auth, books, health, not_found};
use crate::AppState;

/// Build the HTTP router with its middleware stack.
///
/// `request_timeout` bounds each request; when it fires (or the client goes
/// away) the handler future is dropped, cancelling outstanding store calls.
/// Error responses without a body are given a JSON one on the way out.
pub fn router(state: AppState, request_timeout: Duration) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/books", post(books::create_book).get(books::list_books))
        .route(
            "/books/:id",
            get(books::get_book)
                .put(books::update_book)
                .delete(books::delete_book),
        )
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/update", put(auth::update))
        .route("/refresh", post(auth::refresh))
        .route("/revoke", put(auth::revoke))
        .fallback(not_found)
        .layer(TimeoutLayer::new(request_timeout))
        .layer(middleware::map_response(json_error_body))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(state)
}
