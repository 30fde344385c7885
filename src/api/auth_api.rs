use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, warn};

use super::base::{error_message, ApiClient};
use crate::error::AuthenticationError;
use crate::models::{AuthGrant, AuthResponse, LoginRequest, SignupRequest};

/// The remote authentication endpoints the session talks to.
#[async_trait]
pub trait AuthApi: Send + Sync {
    async fn login(&self, request: &LoginRequest) -> Result<AuthGrant, AuthenticationError>;
    async fn signup(&self, request: &SignupRequest) -> Result<AuthGrant, AuthenticationError>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum AuthAction {
    Login,
    Signup,
}

impl AuthAction {
    fn path(self) -> [&'static str; 3] {
        match self {
            AuthAction::Login => ["api", "auth", "login"],
            AuthAction::Signup => ["api", "auth", "signup"],
        }
    }

    fn name(self) -> &'static str {
        match self {
            AuthAction::Login => "login",
            AuthAction::Signup => "signup",
        }
    }

    /// Used when the server rejected the request without saying why.
    fn rejected(self) -> AuthenticationError {
        match self {
            AuthAction::Login => AuthenticationError::new("Login failed"),
            AuthAction::Signup => AuthenticationError::new("Signup failed"),
        }
    }

    /// Used when no usable answer came back at all.
    fn unreachable(self) -> AuthenticationError {
        AuthenticationError::new(format!("An error occurred during {}", self.name()))
    }
}

/// `AuthApi` over HTTP: `POST /api/auth/login` and `POST /api/auth/signup`.
#[derive(Clone, Debug)]
pub struct HttpAuthApi {
    client: ApiClient,
}

impl HttpAuthApi {
    pub fn new(client: ApiClient) -> Self {
        HttpAuthApi { client }
    }

    async fn submit<B>(&self, action: AuthAction, body: &B) -> Result<AuthGrant, AuthenticationError>
    where
        B: Serialize + Sync + ?Sized,
    {
        let url = self.client.endpoint(&action.path());
        debug!("Sending {} request to {}", action.name(), url);

        let response = match self.client.http().post(url.clone()).json(body).send().await {
            Ok(r) => r,
            Err(e) => {
                warn!("{} request to {} failed: {}", action.name(), url, e);
                return Err(action.unreachable());
            }
        };

        let status = response.status();
        let text = response.text().await.map_err(|e| {
            warn!("Error reading {} response body: {}", action.name(), e);
            action.unreachable()
        })?;

        if !status.is_success() {
            debug!("{} rejected with status {}", action.name(), status);
            return Err(error_message(&text)
                .map(AuthenticationError::new)
                .unwrap_or_else(|| action.rejected()));
        }

        let parsed: AuthResponse = serde_json::from_str(&text).map_err(|e| {
            warn!("Error parsing {} response JSON: {}", action.name(), e);
            action.unreachable()
        })?;
        match parsed.into_grant() {
            Some(grant) => Ok(grant),
            None => {
                warn!(
                    "{} succeeded with status {} but returned no token or username",
                    action.name(),
                    status
                );
                Err(action.rejected())
            }
        }
    }
}

#[async_trait]
impl AuthApi for HttpAuthApi {
    async fn login(&self, request: &LoginRequest) -> Result<AuthGrant, AuthenticationError> {
        self.submit(AuthAction::Login, request).await
    }

    async fn signup(&self, request: &SignupRequest) -> Result<AuthGrant, AuthenticationError> {
        self.submit(AuthAction::Signup, request).await
    }
}
