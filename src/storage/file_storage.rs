use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use tracing::{debug, warn};

use super::Storage;
use crate::error::StorageError;

/// A store kept as a single JSON object on disk, the desktop counterpart of
/// browser local storage.
///
/// Contents are read once at open. Every write rewrites the whole file via a
/// temporary sibling and a rename, so a crash never leaves a torn file.
pub struct FileStorage {
    path: PathBuf,
    items: Mutex<BTreeMap<String, String>>,
}

impl FileStorage {
    /// Open (or lazily create) the store at `path`.
    ///
    /// A missing file is an empty store. A file that is not a JSON object of
    /// strings is also treated as empty, with a warning, and is replaced on
    /// the next write.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref().to_path_buf();
        let items = match fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str::<BTreeMap<String, String>>(&raw) {
                Ok(items) => items,
                Err(e) => {
                    warn!(
                        "Ignoring unreadable session storage at '{}': {}",
                        path.display(),
                        e
                    );
                    BTreeMap::new()
                }
            },
            Err(e) if e.kind() == ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(io_error(&path, e)),
        };
        debug!("Loaded {} entries from '{}'", items.len(), path.display());

        Ok(FileStorage {
            path,
            items: Mutex::new(items),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self, items: &BTreeMap<String, String>) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| io_error(parent, e))?;
        }
        let serialized = serde_json::to_string_pretty(items)?;
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, serialized).map_err(|e| io_error(&tmp, e))?;
        fs::rename(&tmp, &self.path).map_err(|e| io_error(&self.path, e))
    }

    /// Apply `change` to a copy of the contents; memory is only updated once
    /// the file write went through.
    fn update(&self, change: impl FnOnce(&mut BTreeMap<String, String>)) -> Result<(), StorageError> {
        let mut items = self.items.lock().unwrap_or_else(PoisonError::into_inner);
        let mut next = items.clone();
        change(&mut next);
        if next == *items {
            return Ok(());
        }
        self.flush(&next)?;
        *items = next;
        Ok(())
    }
}

fn io_error(path: &Path, source: std::io::Error) -> StorageError {
    StorageError::Io {
        path: path.display().to_string(),
        source,
    }
}

impl Storage for FileStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        let items = self.items.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(items.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.update(|items| {
            items.insert(key.to_string(), value.to_string());
        })
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        self.update(|items| {
            items.remove(key);
        })
    }

    /// One flush for all entries, so either every entry lands or none does.
    fn set_items(&self, entries: &[(&str, &str)]) -> Result<(), StorageError> {
        self.update(|items| {
            for (key, value) in entries {
                items.insert(key.to_string(), value.to_string());
            }
        })
    }

    fn remove_items(&self, keys: &[&str]) -> Result<(), StorageError> {
        self.update(|items| {
            for key in keys {
                items.remove(*key);
            }
        })
    }
}
