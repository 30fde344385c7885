use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use tracing::{debug, error, info, warn};

use super::listeners::{Listeners, SubscriptionId};
use crate::api::{bearer, AuthApi};
use crate::error::{AuthenticationError, StorageError};
use crate::models::{
    decode_token, AuthGrant, Identity, LoginRequest, SignupRequest, TokenClaims,
};
use crate::storage::{Storage, IDENTITY_KEY, TOKEN_KEY};

/// Rejection for a login/signup started while another one is still pending.
pub const ALREADY_IN_PROGRESS: &str = "An authentication request is already in progress";
/// Rejection for a login/signup whose answer arrived after a logout.
pub const SESSION_CHANGED: &str = "Session changed while authenticating";

/// The derived view of a session handed to listeners.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub is_authenticated: bool,
    pub is_admin: bool,
    pub username: String,
}

impl SessionSnapshot {
    fn of(grant: Option<&AuthGrant>) -> Self {
        match grant {
            Some(grant) => SessionSnapshot {
                is_authenticated: true,
                is_admin: grant.identity.is_admin(),
                username: grant.identity.username.clone(),
            },
            None => SessionSnapshot::default(),
        }
    }
}

enum Attempt<'a> {
    Login(&'a LoginRequest),
    Signup(&'a SignupRequest),
}

/// Clears the in-flight flag when the attempt ends, however it ends.
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// The current user's authentication state, kept in step with storage.
///
/// Token and identity live in one `Option<AuthGrant>`, so they are always set
/// and cleared together. Every mutation writes storage while holding the
/// state lock, before any listener runs.
pub struct Session {
    grant: RwLock<Option<AuthGrant>>,
    storage: Arc<dyn Storage>,
    api: Arc<dyn AuthApi>,
    in_flight: AtomicBool,
    /// Bumped by every logout; a pending attempt from an older generation is discarded.
    generation: AtomicU64,
    last_error: Mutex<Option<String>>,
    listeners: Listeners,
}

impl Session {
    /// Build a session, restoring whatever `storage` holds from a previous run.
    pub fn new(storage: Arc<dyn Storage>, api: Arc<dyn AuthApi>) -> Self {
        let grant = restore(storage.as_ref());
        match &grant {
            Some(grant) => info!("Restored session for user '{}'", grant.identity.username),
            None => debug!("No stored session, starting logged out"),
        }

        Session {
            grant: RwLock::new(grant),
            storage,
            api,
            in_flight: AtomicBool::new(false),
            generation: AtomicU64::new(0),
            last_error: Mutex::new(None),
            listeners: Listeners::default(),
        }
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<Identity, AuthenticationError> {
        let request = LoginRequest::new(username, password);
        self.authenticate(Attempt::Login(&request)).await
    }

    pub async fn signup(
        &self,
        username: &str,
        email: &str,
        password: &str,
        request_admin: bool,
    ) -> Result<Identity, AuthenticationError> {
        let request = SignupRequest::new(username, email, password, request_admin);
        self.authenticate(Attempt::Signup(&request)).await
    }

    /// Forget the current user. Never fails; storage errors are only logged.
    pub fn logout(&self) {
        let snapshot = {
            let mut grant = self.grant.write().unwrap_or_else(PoisonError::into_inner);
            self.generation.fetch_add(1, Ordering::AcqRel);
            if let Some(previous) = grant.as_ref() {
                info!("Logging out user '{}'", previous.identity.username);
            }
            self.persist(None);
            *grant = None;
            SessionSnapshot::default()
        };
        self.listeners.notify(&snapshot);
    }

    async fn authenticate(&self, attempt: Attempt<'_>) -> Result<Identity, AuthenticationError> {
        let _in_flight = self.begin()?;
        let generation = self.generation.load(Ordering::Acquire);
        self.set_last_error(None);

        let result = match attempt {
            Attempt::Login(request) => {
                debug!("Logging in as '{}'", request.username);
                self.api.login(request).await
            }
            Attempt::Signup(request) => {
                debug!("Signing up as '{}'", request.username);
                self.api.signup(request).await
            }
        };

        match result.and_then(|grant| self.replace(grant, generation)) {
            Ok(identity) => Ok(identity),
            Err(e) => {
                warn!("Authentication failed: {}", e);
                self.set_last_error(Some(e.message.clone()));
                Err(e)
            }
        }
    }

    fn begin(&self) -> Result<InFlight<'_>, AuthenticationError> {
        self.in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| InFlight(&self.in_flight))
            .map_err(|_| AuthenticationError::new(ALREADY_IN_PROGRESS))
    }

    /// Install a fresh grant unless a logout happened since `generation`.
    fn replace(&self, next: AuthGrant, generation: u64) -> Result<Identity, AuthenticationError> {
        let identity = next.identity.clone();
        let snapshot = {
            let mut grant = self.grant.write().unwrap_or_else(PoisonError::into_inner);
            if self.generation.load(Ordering::Acquire) != generation {
                return Err(AuthenticationError::new(SESSION_CHANGED));
            }
            self.persist(Some(&next));
            let snapshot = SessionSnapshot::of(Some(&next));
            *grant = Some(next);
            snapshot
        };
        info!(
            "Authenticated user '{}' (admin: {})",
            snapshot.username, snapshot.is_admin
        );
        self.listeners.notify(&snapshot);
        Ok(identity)
    }

    /// Write or clear both entries. If writing a new pair fails partway,
    /// both entries are removed so storage never pairs one user's token
    /// with another user's identity.
    fn persist(&self, grant: Option<&AuthGrant>) {
        let result = match grant {
            Some(grant) => serde_json::to_string(&grant.identity)
                .map_err(StorageError::from)
                .and_then(|identity| {
                    self.storage
                        .set_items(&[(TOKEN_KEY, &grant.token), (IDENTITY_KEY, &identity)])
                }),
            None => self.storage.remove_items(&[TOKEN_KEY, IDENTITY_KEY]),
        };
        if let Err(e) = result {
            error!("Failed to persist session: {}", e);
            if grant.is_some() {
                if let Err(e) = self.storage.remove_items(&[TOKEN_KEY, IDENTITY_KEY]) {
                    error!("Failed to clear stored session after a failed write: {}", e);
                }
            }
        }
    }

    fn set_last_error(&self, message: Option<String>) {
        *self.last_error.lock().unwrap_or_else(PoisonError::into_inner) = message;
    }

    fn read<T>(&self, f: impl FnOnce(Option<&AuthGrant>) -> T) -> T {
        let grant = self.grant.read().unwrap_or_else(PoisonError::into_inner);
        f(grant.as_ref())
    }

    pub fn is_authenticated(&self) -> bool {
        self.read(|grant| grant.is_some())
    }

    pub fn is_admin(&self) -> bool {
        self.read(|grant| grant.is_some_and(|g| g.identity.is_admin()))
    }

    /// The current username, or an empty string when logged out.
    pub fn username(&self) -> String {
        self.read(|grant| grant.map(|g| g.identity.username.clone()).unwrap_or_default())
    }

    /// False when logged out; true for any authenticated user when no role is
    /// required; otherwise whether the user holds `required_role`.
    pub fn check_access(&self, required_role: Option<&str>) -> bool {
        self.read(|grant| match (grant, required_role) {
            (None, _) => false,
            (Some(_), None) => true,
            (Some(g), Some(role)) => g.identity.has_role(role),
        })
    }

    /// The bearer token, or an empty string when logged out.
    pub fn token(&self) -> String {
        self.read(|grant| grant.map(|g| g.token.clone()).unwrap_or_default())
    }

    pub fn identity(&self) -> Option<Identity> {
        self.read(|grant| grant.map(|g| g.identity.clone()))
    }

    /// `Authorization` header value for authenticated API calls.
    pub fn authorization_header(&self) -> Option<String> {
        self.read(|grant| grant.map(|g| bearer(&g.token)))
    }

    /// Claims read from the current token, for display. Never verified.
    pub fn claims(&self) -> Option<TokenClaims> {
        self.read(|grant| grant.and_then(|g| decode_token(&g.token)))
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.read(SessionSnapshot::of)
    }

    /// True while a login or signup request is awaiting its answer.
    pub fn is_loading(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Message of the last failed login/signup; cleared when a new one starts.
    pub fn last_error(&self) -> Option<String> {
        self.last_error
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Whether the session survives a restart.
    pub fn is_persistent(&self) -> bool {
        self.storage.is_persistent()
    }

    /// Register a callback run after every login, signup and logout.
    pub fn subscribe<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(&SessionSnapshot) + Send + Sync + 'static,
    {
        self.listeners.subscribe(listener)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.listeners.unsubscribe(id)
    }
}

/// Read token and identity back. Anything missing or unreadable means
/// logged out; storage is left as it is.
fn restore(storage: &dyn Storage) -> Option<AuthGrant> {
    let read = |key: &str| match storage.get_item(key) {
        Ok(value) => value,
        Err(e) => {
            warn!("Could not read '{}' from session storage: {}", key, e);
            None
        }
    };

    let token = read(TOKEN_KEY).filter(|t| !t.is_empty())?;
    let raw_identity = read(IDENTITY_KEY)?;
    match Identity::from_json(&raw_identity) {
        Some(identity) => Some(AuthGrant { token, identity }),
        None => {
            warn!("Stored identity could not be parsed, starting logged out");
            None
        }
    }
}
