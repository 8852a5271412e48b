pub mod books;
pub mod sessions;
pub mod users;

pub use books::BookService;
pub use sessions::SessionService;
pub use users::UserService;
