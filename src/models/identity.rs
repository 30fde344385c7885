use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Role tag granting access to the admin dashboard and book management.
pub const ADMIN_ROLE: &str = "ADMIN";

/// The Identity struct represents the user a session is authenticated as.
///
/// This is the record persisted next to the bearer token, serialized as
/// `{"username": ..., "roles": [...]}`.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Identity {
    pub username: String,
    #[serde(default, deserialize_with = "roles_or_empty")]
    pub roles: BTreeSet<String>,
}

impl Identity {
    /// Construct a new Identity from a username and any iterable of roles.
    pub fn new<I, S>(username: impl Into<String>, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Identity {
            username: username.into(),
            roles: roles.into_iter().map(Into::into).collect(),
        }
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.contains(role)
    }

    pub fn is_admin(&self) -> bool {
        self.has_role(ADMIN_ROLE)
    }

    /// Parse a persisted identity record. Returns `None` for anything that is
    /// not a JSON object with a non-empty username.
    pub fn from_json(raw: &str) -> Option<Self> {
        serde_json::from_str::<Identity>(raw)
            .ok()
            .filter(|identity| !identity.username.is_empty())
    }
}

/// A `null` roles list is accepted and treated as no roles.
fn roles_or_empty<'de, D>(deserializer: D) -> Result<BTreeSet<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<BTreeSet<String>>::deserialize(deserializer)?.unwrap_or_default())
}
