//! The gate's session state block and the snapshot handed to subscribers.

use crate::principal::{Claims, Principal};
use crate::role::Role;

/// Mutable state guarded by the gate's lock.
///
/// `epoch` increases on every accepted session event. Resolutions are tagged
/// with the epoch they started under and applied only if it is still current.
#[derive(Debug)]
pub(crate) struct SessionState {
    pub(crate) epoch: u64,
    pub(crate) principal: Option<Principal>,
    pub(crate) role: Option<Role>,
    pub(crate) resolving: bool,
    /// Principal and claims the current `role` was computed from
    pub(crate) resolved_for: Option<ResolutionKey>,
}

impl SessionState {
    /// Initial state: no session event seen yet, so decisions are pending.
    pub(crate) fn awaiting_first_event() -> Self {
        Self {
            epoch: 0,
            principal: None,
            role: None,
            resolving: true,
            resolved_for: None,
        }
    }

    /// Drops the principal and its role.
    pub(crate) fn clear(&mut self) {
        self.principal = None;
        self.role = None;
        self.resolving = false;
        self.resolved_for = None;
    }

    pub(crate) fn principal_id(&self) -> Option<&str> {
        self.principal.as_ref().map(|p| p.id.as_str())
    }

    pub(crate) fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            epoch: self.epoch,
            principal_id: self.principal.as_ref().map(|p| p.id.clone()),
            email: self.principal.as_ref().map(|p| p.email.clone()),
            role: self.role,
            resolving: self.resolving,
        }
    }
}

/// Identity of a completed resolution, used to make re-resolution idempotent.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ResolutionKey {
    principal_id: String,
    claims: Claims,
}

impl ResolutionKey {
    pub(crate) fn of(principal: &Principal) -> Self {
        Self {
            principal_id: principal.id.clone(),
            claims: principal.claims.clone(),
        }
    }
}

/// Read-only view of the gate's session, delivered to subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    /// Session epoch the snapshot was taken at
    pub epoch: u64,
    /// Current principal identifier, if signed in
    pub principal_id: Option<String>,
    /// Current principal email, if signed in
    pub email: Option<String>,
    /// Resolved role, if any
    pub role: Option<Role>,
    /// `true` while role resolution is in flight
    pub resolving: bool,
}

impl SessionSnapshot {
    /// Returns `true` when a principal is present and no resolution is pending.
    pub fn is_signed_in(&self) -> bool {
        self.principal_id.is_some() && !self.resolving
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::SessionToken;

    fn principal(role: Role) -> Principal {
        Principal::new(
            "uid-1",
            "a@school.test",
            SessionToken::new("t"),
            Claims::new().with_role(role),
        )
    }

    #[test]
    fn initial_state_is_resolving_without_principal() {
        let state = SessionState::awaiting_first_event();
        assert!(state.resolving);
        assert!(state.principal.is_none());
        assert!(!state.snapshot().is_signed_in());
    }

    #[test]
    fn clear_drops_everything_but_epoch() {
        let mut state = SessionState::awaiting_first_event();
        state.epoch = 4;
        state.principal = Some(principal(Role::Admin));
        state.role = Some(Role::Admin);
        state.resolved_for = Some(ResolutionKey::of(&principal(Role::Admin)));

        state.clear();

        assert_eq!(state.epoch, 4);
        assert!(state.principal.is_none());
        assert!(state.role.is_none());
        assert!(!state.resolving);
        assert!(state.resolved_for.is_none());
    }

    #[test]
    fn resolution_key_changes_with_claims() {
        assert_eq!(
            ResolutionKey::of(&principal(Role::Student)),
            ResolutionKey::of(&principal(Role::Student))
        );
        assert_ne!(
            ResolutionKey::of(&principal(Role::Student)),
            ResolutionKey::of(&principal(Role::Teacher))
        );
    }

    #[test]
    fn snapshot_copies_identity_fields() {
        let mut state = SessionState::awaiting_first_event();
        state.epoch = 2;
        state.resolving = false;
        state.principal = Some(principal(Role::Teacher));
        state.role = Some(Role::Teacher);

        let snapshot = state.snapshot();
        assert_eq!(snapshot.epoch, 2);
        assert_eq!(snapshot.principal_id.as_deref(), Some("uid-1"));
        assert_eq!(snapshot.email.as_deref(), Some("a@school.test"));
        assert_eq!(snapshot.role, Some(Role::Teacher));
        assert!(snapshot.is_signed_in());
    }
}
