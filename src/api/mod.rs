pub mod auth_api;
pub mod base;
pub mod books_api;

// Re-export so callers can do "use crate::api::{AuthApi, BooksApi};"
pub use auth_api::{AuthApi, HttpAuthApi};
pub use base::{bearer, ApiClient};
pub use books_api::BooksApi;
