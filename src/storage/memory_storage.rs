use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use super::Storage;
use crate::error::StorageError;

/// A process-local store. Nothing survives a restart.
#[derive(Default)]
pub struct MemoryStorage {
    items: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        let items = self.items.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(items.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut items = self.items.lock().unwrap_or_else(PoisonError::into_inner);
        items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        let mut items = self.items.lock().unwrap_or_else(PoisonError::into_inner);
        items.remove(key);
        Ok(())
    }

    fn set_items(&self, entries: &[(&str, &str)]) -> Result<(), StorageError> {
        let mut items = self.items.lock().unwrap_or_else(PoisonError::into_inner);
        for (key, value) in entries {
            items.insert(key.to_string(), value.to_string());
        }
        Ok(())
    }

    fn remove_items(&self, keys: &[&str]) -> Result<(), StorageError> {
        let mut items = self.items.lock().unwrap_or_else(PoisonError::into_inner);
        for key in keys {
            items.remove(*key);
        }
        Ok(())
    }

    fn is_persistent(&self) -> bool {
        false
    }
}
