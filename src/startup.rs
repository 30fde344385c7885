//! Application startup.
//!
//! Builds the session storage, the HTTP clients and the session itself from
//! configuration.

use std::sync::Arc;

use tracing::info;

use crate::api::{ApiClient, BooksApi, HttpAuthApi};
use crate::config::ConfigV1;
use crate::error::StartupError;
use crate::session::Session;
use crate::state::AppContext;
use crate::storage::create_storage;

/// Construct the application context.
///
/// The session is restored from storage as part of this, so the returned
/// context already reflects a previous login.
///
/// # Errors
///
/// Returns an error if the storage backend cannot be opened or the API base
/// URL is not a usable http(s) URL.
pub fn build_context(config: Arc<ConfigV1>) -> Result<AppContext, StartupError> {
    let storage = create_storage(&config.storage)?;
    let client = ApiClient::new(&config.api)?;
    info!(
        "Using API at {} (persistent session: {})",
        config.api.base_url,
        storage.is_persistent()
    );

    let session = Arc::new(Session::new(
        storage,
        Arc::new(HttpAuthApi::new(client.clone())),
    ));

    Ok(AppContext {
        config,
        session,
        books: BooksApi::new(client),
    })
}
