//! Error types shared across the crate.

use thiserror::Error;

/// Login or signup was rejected by the remote endpoint or could not reach it.
///
/// Carries the server-provided message when there was one, otherwise a
/// generic message. Network failures and rejected credentials are not
/// distinguished beyond that message.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct AuthenticationError {
    pub message: String,
}

impl AuthenticationError {
    pub fn new(message: impl Into<String>) -> Self {
        AuthenticationError {
            message: message.into(),
        }
    }
}

/// Why a token payload could not be read. Only ever logged, never surfaced.
#[derive(Debug, Error)]
pub enum TokenDecodeFailure {
    #[error("token has no payload segment")]
    MissingPayload,
    #[error("payload is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("payload is not a claims object: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to serialize storage contents: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum BooksError {
    #[error("not authenticated: a bearer token is required")]
    MissingToken,
    #[error("invalid book: {0}")]
    Invalid(String),
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("{message}")]
    Status { status: u16, message: String },
    #[error("unexpected response body: {0}")]
    Decode(String),
}

/// Failures while building the application context from configuration.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("could not open session storage: {0}")]
    Storage(#[from] StorageError),
    #[error("invalid api.base_url '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },
    #[error("could not build HTTP client: {0}")]
    Http(#[from] reqwest::Error),
}

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("invalid logging.level '{0}'. Valid values: trace, debug, info, warn, error")]
    InvalidLevel(String),
    #[error("invalid logging.format '{0}'. Valid values: json, console, compact")]
    InvalidFormat(String),
    #[error("a global tracing subscriber is already installed")]
    AlreadyInitialized,
}
