use std::path::Path;
use std::sync::Arc;

use jsonwebtoken::{encode, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use storefront_session::config::{
    ApiConfig, ConfigV1, FileStorageConfig, StorageBackend, StorageConfig,
};
use storefront_session::startup::build_context;
use storefront_session::state::AppContext;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String,
    pub groups: Vec<String>,
    pub iss: String,
    pub iat: i64,
    pub exp: i64,
}

/// A signed token of the shape the storefront API hands out.
pub fn mint_token(username: &str, roles: &[&str], exp: i64) -> String {
    let claims = Claims {
        sub: username.to_string(),
        groups: roles.iter().map(|r| r.to_string()).collect(),
        iss: "bookstore".to_string(),
        iat: exp - 3600,
        exp,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(b"integration-test-secret"),
    )
    .expect("failed to mint token")
}

pub fn config_for(base_url: &str, session_file: Option<&Path>) -> ConfigV1 {
    let storage = match session_file {
        Some(path) => StorageConfig {
            enabled: true,
            backend: Some(StorageBackend::File(FileStorageConfig {
                path: path.to_path_buf(),
            })),
        },
        None => StorageConfig {
            enabled: true,
            backend: Some(StorageBackend::Memory),
        },
    };
    ConfigV1 {
        api: ApiConfig {
            base_url: base_url.to_string(),
        },
        storage,
        ..ConfigV1::default()
    }
}

pub fn context_for(base_url: &str, session_file: Option<&Path>) -> AppContext {
    build_context(Arc::new(config_for(base_url, session_file))).expect("failed to build context")
}

/// Body of a successful login or signup.
pub fn auth_body(token: &str, username: &str, roles: &[&str]) -> String {
    serde_json::json!({
        "token": token,
        "username": username,
        "roles": roles,
    })
    .to_string()
}
