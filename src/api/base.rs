use reqwest::{Client, Url};
use serde::Deserialize;

use crate::config::ApiConfig;
use crate::error::StartupError;

/// Shared HTTP plumbing for the storefront API: one connection pool and a
/// parsed base URL that endpoint paths are appended to.
#[derive(Clone, Debug)]
pub struct ApiClient {
    base: Url,
    http: Client,
}

impl ApiClient {
    pub fn new(config: &ApiConfig) -> Result<Self, StartupError> {
        let invalid = |reason: String| StartupError::InvalidBaseUrl {
            url: config.base_url.clone(),
            reason,
        };
        let base = Url::parse(&config.base_url).map_err(|e| invalid(e.to_string()))?;
        if base.cannot_be_a_base() || !matches!(base.scheme(), "http" | "https") {
            return Err(invalid("expected an http(s) URL".to_string()));
        }

        let http = Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(ApiClient { base, http })
    }

    pub fn http(&self) -> &Client {
        &self.http
    }

    /// Append path segments to the base URL. Segments are percent-encoded,
    /// so ids can never escape their position in the path.
    pub fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }
}

/// `Authorization` header value for a bearer token.
pub fn bearer(token: &str) -> String {
    format!("Bearer {}", token)
}

/// Error bodies seen from the API: auth endpoints use `message`, book
/// endpoints use `error`.
#[derive(Deserialize, Default)]
struct ErrorBody {
    message: Option<String>,
    error: Option<String>,
}

/// Pull a human readable message out of an error response body, if any.
pub fn error_message(body: &str) -> Option<String> {
    let parsed: ErrorBody = serde_json::from_str(body).ok()?;
    parsed
        .message
        .or(parsed.error)
        .filter(|m| !m.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base_url: &str) -> Result<ApiClient, StartupError> {
        ApiClient::new(&ApiConfig {
            base_url: base_url.to_string(),
        })
    }

    #[test]
    fn test_endpoint_joins_segments() {
        let api = client("http://localhost:8081").unwrap();
        assert_eq!(
            api.endpoint(&["api", "auth", "login"]).as_str(),
            "http://localhost:8081/api/auth/login"
        );

        let prefixed = client("https://shop.example.com/store/").unwrap();
        assert_eq!(
            prefixed.endpoint(&["api", "books", "42"]).as_str(),
            "https://shop.example.com/store/api/books/42"
        );
    }

    #[test]
    fn test_endpoint_encodes_ids() {
        let api = client("http://localhost:8081").unwrap();
        assert_eq!(
            api.endpoint(&["api", "books", "7/edit"]).as_str(),
            "http://localhost:8081/api/books/7%2Fedit"
        );
    }

    #[test]
    fn test_rejects_bad_base_urls() {
        assert!(client("not a url").is_err());
        assert!(client("mailto:someone@example.com").is_err());
        assert!(client("ftp://example.com").is_err());
    }

    #[test]
    fn test_error_message() {
        assert_eq!(
            error_message(r#"{"message":"Invalid credentials"}"#).as_deref(),
            Some("Invalid credentials")
        );
        assert_eq!(
            error_message(r#"{"error":"Book not found"}"#).as_deref(),
            Some("Book not found")
        );
        assert_eq!(error_message(r#"{"message":""}"#), None);
        assert_eq!(error_message("<html>oops</html>"), None);
    }

    #[test]
    fn test_bearer() {
        assert_eq!(bearer("abc"), "Bearer abc");
    }
}
