pub mod access;
pub mod listeners;
#[allow(clippy::module_inception)]
pub mod session;

pub use access::{guard, AccessDecision};
pub use listeners::SubscriptionId;
pub use session::{Session, SessionSnapshot, ALREADY_IN_PROGRESS, SESSION_CHANGED};
