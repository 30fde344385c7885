use tracing::debug;

use super::session::Session;

/// Outcome of guarding a protected view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDecision {
    Granted,
    /// Nobody is logged in.
    RedirectToLogin,
    /// Logged in, but without the required role.
    Unauthorized,
}

impl AccessDecision {
    pub fn is_granted(self) -> bool {
        self == AccessDecision::Granted
    }

    /// Where a denied visitor is sent, if anywhere.
    pub fn redirect_path(self) -> Option<&'static str> {
        match self {
            AccessDecision::Granted => None,
            AccessDecision::RedirectToLogin => Some("/login"),
            AccessDecision::Unauthorized => Some("/unauthorized"),
        }
    }
}

/// Decide whether the current user may enter a view requiring `required_role`.
pub fn guard(session: &Session, required_role: Option<&str>) -> AccessDecision {
    let decision = if !session.is_authenticated() {
        AccessDecision::RedirectToLogin
    } else if session.check_access(required_role) {
        AccessDecision::Granted
    } else {
        AccessDecision::Unauthorized
    };
    debug!(
        "Access check for role {:?}: {:?}",
        required_role.unwrap_or("<any>"),
        decision
    );
    decision
}
