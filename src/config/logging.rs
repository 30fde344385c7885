use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// LoggingConfig controls how we initialize tracing/logging.
#[derive(Deserialize, Serialize, Debug, Clone, JsonSchema)]
pub struct LoggingConfig {
    pub level: String,  // e.g. "info", "debug", "warn"
    pub format: String, // e.g. "json", "console", "compact"
    /// Reported as `service.name` in JSON output; defaults to the crate name.
    #[serde(default)]
    pub service_name: Option<String>,
    #[serde(default)]
    pub service_version: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: "info".to_string(),
            format: "console".to_string(),
            service_name: None,
            service_version: None,
        }
    }
}
