pub mod book;
pub mod session;
pub mod user;
