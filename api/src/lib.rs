//! Bookstore API: books, users and sessions behind a JSON HTTP surface.
//!
//! The library holds every layer so the binary and the integration tests
//! share one code path.

pub mod auth;
pub mod cache;
pub mod config;
pub mod crypto;
pub mod db;
pub mod error;
pub mod handlers;
pub mod models;
pub mod repositories;
pub mod rest;
pub mod services;
pub mod slug;
pub mod state;

pub use state::AppState;
