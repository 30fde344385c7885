use std::fmt;

use serde::{Deserialize, Serialize};

use super::identity::Identity;

/// Body of `POST /api/auth/login`.
#[derive(Serialize, Clone)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Body of `POST /api/auth/signup`.
#[derive(Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    /// Asks the server to grant the ADMIN role to the new account.
    pub is_admin: bool,
}

impl LoginRequest {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        LoginRequest {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl SignupRequest {
    pub fn new(
        username: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
        is_admin: bool,
    ) -> Self {
        SignupRequest {
            username: username.into(),
            email: email.into(),
            password: password.into(),
            is_admin,
        }
    }
}

// Passwords never reach the logs.
impl fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginRequest")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl fmt::Debug for SignupRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignupRequest")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("is_admin", &self.is_admin)
            .finish()
    }
}

/// Response body shared by the login and signup endpoints.
///
/// Success carries `token`, `username` and `roles`; failure carries `message`.
/// Every field is optional on the wire, the HTTP status decides which case applies.
#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct AuthResponse {
    pub token: Option<String>,
    pub username: Option<String>,
    pub roles: Option<Vec<String>>,
    pub message: Option<String>,
}

/// What a successful login or signup hands to the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthGrant {
    pub token: String,
    pub identity: Identity,
}

impl AuthResponse {
    /// Split a successful response into the bearer token and identity.
    /// Returns `None` if the token or username is missing or empty.
    pub fn into_grant(self) -> Option<AuthGrant> {
        let token = self.token.filter(|t| !t.is_empty())?;
        let username = self.username.filter(|u| !u.is_empty())?;
        Some(AuthGrant {
            token,
            identity: Identity::new(username, self.roles.unwrap_or_default()),
        })
    }
}
