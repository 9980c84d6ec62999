//! Authenticated principals, their verified claims, and session events.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::role::Role;
use crate::token::SessionToken;

/// Name of the claim that carries the principal's role.
pub const ROLE_CLAIM: &str = "role";

/// Claim name to claim value mapping embedded in a verified session token.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Claims(BTreeMap<String, Value>);

impl Claims {
    /// Creates an empty claim set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a claim, returning the updated set.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    /// Shorthand for `with(ROLE_CLAIM, role.as_str())`.
    pub fn with_role(self, role: Role) -> Self {
        self.with(ROLE_CLAIM, role.as_str())
    }

    /// Adds or replaces a claim.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(name.into(), value.into());
    }

    /// Removes a claim, returning its previous value.
    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.0.remove(name)
    }

    /// Returns the raw value of a claim.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// Interprets the `role` claim.
    pub fn role_claim(&self) -> RoleClaim {
        match self.0.get(ROLE_CLAIM) {
            None | Some(Value::Null) => RoleClaim::Missing,
            Some(Value::String(raw)) => match raw.parse() {
                Ok(role) => RoleClaim::Valid(role),
                Err(_) => RoleClaim::Malformed(raw.clone()),
            },
            Some(other) => RoleClaim::Malformed(other.to_string()),
        }
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Claims {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(name, value)| (name.into(), value.into()))
                .collect(),
        )
    }
}

/// What the `role` claim of a token says.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoleClaim {
    /// No role claim (or an explicit null)
    Missing,
    /// A recognised role
    Valid(Role),
    /// A role claim whose value is not a known role name
    Malformed(String),
}

impl RoleClaim {
    /// The role, if the claim is valid.
    pub fn role(&self) -> Option<Role> {
        match self {
            RoleClaim::Valid(role) => Some(*role),
            _ => None,
        }
    }
}

/// An authenticated actor as handed out by the identity provider.
#[derive(Debug, Clone, PartialEq)]
pub struct Principal {
    /// Immutable identifier assigned at account creation
    pub id: String,
    /// Email address, unique per principal
    pub email: String,
    /// Signed session credential
    pub token: SessionToken,
    /// Claims carried by the token, trusted once the provider has verified it
    pub claims: Claims,
}

impl Principal {
    /// Creates a principal handle.
    pub fn new(
        id: impl Into<String>,
        email: impl Into<String>,
        token: SessionToken,
        claims: Claims,
    ) -> Self {
        Self {
            id: id.into(),
            email: email.into(),
            token,
            claims,
        }
    }

    /// Interprets this principal's `role` claim.
    pub fn role_claim(&self) -> RoleClaim {
        self.claims.role_claim()
    }
}

/// Notification delivered by the identity provider.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// A principal signed in (or the provider restored a persisted session)
    SignedIn(Principal),
    /// The provider renewed the token of the current principal
    TokenRefreshed(Principal),
    /// The session ended
    SignedOut,
}

impl SessionEvent {
    /// Principal carried by the event, if any.
    pub fn principal(&self) -> Option<&Principal> {
        match self {
            SessionEvent::SignedIn(p) | SessionEvent::TokenRefreshed(p) => Some(p),
            SessionEvent::SignedOut => None,
        }
    }
}
