use std::sync::Arc;

use tracing::info;

use super::{file_storage::FileStorage, memory_storage::MemoryStorage};
use crate::config::{StorageBackend, StorageConfig};
use crate::error::StorageError;

/// Key under which the bearer token is persisted.
pub const TOKEN_KEY: &str = "authToken";
/// Key under which the JSON identity record is persisted.
pub const IDENTITY_KEY: &str = "user";

/// The Storage trait abstracts a string-keyed local store (get, set, remove).
///
/// Calls are synchronous so a session mutation and its persistence happen
/// without a yield point in between.
pub trait Storage: Send + Sync {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove_item(&self, key: &str) -> Result<(), StorageError>;

    /// Write several entries. Backends that can should apply them all or
    /// none; this fallback stops at the first failure.
    fn set_items(&self, entries: &[(&str, &str)]) -> Result<(), StorageError> {
        entries
            .iter()
            .try_for_each(|(key, value)| self.set_item(key, value))
    }

    /// Remove several entries. Every removal is attempted; the first error is returned.
    fn remove_items(&self, keys: &[&str]) -> Result<(), StorageError> {
        keys.iter()
            .map(|key| self.remove_item(key))
            .fold(Ok(()), |first, next| first.and(next))
    }

    fn is_persistent(&self) -> bool {
        // Real backends survive a restart; only the in-memory fallback doesn't.
        true
    }
}

/// Creates a concrete storage implementation based on the StorageConfig.
/// If `storage.enabled = false` or no backend is configured, returns MemoryStorage.
pub fn create_storage(config: &StorageConfig) -> Result<Arc<dyn Storage>, StorageError> {
    if !config.enabled {
        info!("Session persistence is disabled. Using in-memory storage.");
        return Ok(Arc::new(MemoryStorage::new()));
    }

    match &config.backend {
        Some(StorageBackend::File(file_config)) => {
            let storage = FileStorage::open(&file_config.path)?;
            info!("Opened session storage at '{}'.", storage.path().display());
            Ok(Arc::new(storage))
        }
        Some(StorageBackend::Memory) | None => {
            info!("Using in-memory session storage.");
            Ok(Arc::new(MemoryStorage::new()))
        }
    }
}
