//! Storage contracts and their SQLite implementations.
//!
//! Services depend only on the traits, so tests and alternative backends can
//! swap the storage without touching business rules.

pub mod books;
pub mod sessions;
pub mod users;

pub use books::{BookRepository, SqliteBookRepository, PAGE_SIZE};
pub use sessions::{SessionRepository, SqliteSessionRepository};
pub use users::{SqliteUserRepository, UserRepository};

pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .is_some_and(|db_err| db_err.is_unique_violation())
}
