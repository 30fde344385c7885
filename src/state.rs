//! Shared application context.
//!
//! Everything a command needs, built once at startup and passed explicitly.

use std::sync::Arc;

use crate::api::BooksApi;
use crate::config::ConfigV1;
use crate::session::Session;

#[derive(Clone)]
pub struct AppContext {
    /// Application configuration loaded at startup.
    pub config: Arc<ConfigV1>,
    /// The current user's session, restored from storage.
    pub session: Arc<Session>,
    pub books: BooksApi,
}

impl AppContext {
    /// The bearer token for book writes, empty when logged out.
    pub fn token(&self) -> String {
        self.session.token()
    }
}
