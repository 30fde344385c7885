use std::path::PathBuf;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A wrapper for the session storage configuration:
/// - enabled: if false, nothing is persisted (in-memory storage).
/// - backend: where the session is kept between runs.
#[derive(Deserialize, Serialize, Debug, Clone, JsonSchema)]
pub struct StorageConfig {
    pub enabled: bool,
    #[serde(flatten)]
    pub backend: Option<StorageBackend>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig {
            enabled: true,
            backend: Some(StorageBackend::File(FileStorageConfig::default())),
        }
    }
}

/// The available storage backends, told apart by a "type" tag in the YAML.
#[derive(Deserialize, Serialize, Debug, Clone, JsonSchema)]
#[serde(tag = "type")]
pub enum StorageBackend {
    #[serde(rename = "file")]
    File(FileStorageConfig),
    #[serde(rename = "memory")]
    Memory,
}

#[derive(Deserialize, Serialize, Debug, Clone, JsonSchema)]
pub struct FileStorageConfig {
    pub path: PathBuf,
}

impl Default for FileStorageConfig {
    fn default() -> Self {
        FileStorageConfig {
            path: PathBuf::from(".storefront/session.json"),
        }
    }
}
