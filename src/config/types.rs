use std::path::Path;

use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use schemars::{schema_for, JsonSchema};
use serde::{Deserialize, Serialize};

use super::logging::LoggingConfig;
use super::storage::StorageConfig;

/// Prefix for environment overrides, e.g. `STOREFRONT_API__BASE_URL`.
pub const ENV_PREFIX: &str = "STOREFRONT_";

/// A top-level enum for versioned configurations.
#[derive(Deserialize, Serialize, JsonSchema, Debug, Clone)]
#[serde(tag = "version")]
pub enum Config {
    #[serde(rename = "1.0.0")]
    ConfigV1(ConfigV1),
}

/// Main config for v1.0.0: where the remote API lives, where the session is
/// persisted, and how we log.
#[derive(Deserialize, Serialize, Debug, Clone, Default, JsonSchema)]
pub struct ConfigV1 {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// The remote storefront API (authentication and books).
#[derive(Deserialize, Serialize, Debug, Clone, JsonSchema)]
pub struct ApiConfig {
    pub base_url: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        ApiConfig {
            base_url: "http://localhost:8081".to_string(),
        }
    }
}

/// Layer built-in defaults, the YAML file at `path` (if it exists) and
/// `STOREFRONT_*` environment variables, in that order.
pub fn config_figment(path: impl AsRef<Path>) -> Figment {
    Figment::new()
        .merge(Serialized::defaults(Config::ConfigV1(ConfigV1::default())))
        .merge(Yaml::file(path.as_ref()))
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
}

/// Load the configuration. Handle migration between versions here when necessary.
pub fn load_config(path: impl AsRef<Path>) -> Result<ConfigV1, figment::Error> {
    let figment = config_figment(path);
    let config = match figment.extract::<Config>()? {
        Config::ConfigV1(c) => c,
    };
    check_storage_backend(&figment, &config.storage)?;
    Ok(config)
}

/// A flattened, tagged backend comes out as `None` for an unknown `type`
/// instead of failing, so catch that here rather than silently falling back
/// to memory storage.
fn check_storage_backend(figment: &Figment, storage: &StorageConfig) -> Result<(), figment::Error> {
    if storage.backend.is_some() {
        return Ok(());
    }
    match figment.find_value("storage.type") {
        Ok(value) => Err(figment::Error::from(format!(
            "unknown storage type '{}', expected 'file' or 'memory'",
            value.as_str().unwrap_or("<not a string>")
        ))),
        Err(_) => Ok(()),
    }
}

/// The JSON schema for the configuration, pretty printed.
pub fn config_schema() -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&schema_for!(Config))
}
