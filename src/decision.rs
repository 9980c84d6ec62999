use std::fmt;

use crate::role::Role;

/// Outcome of a single authorization attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The principal may enter the resource
    Granted,
    /// Role resolution is still in flight; render a neutral waiting state
    Pending,
    /// No principal is signed in
    DeniedUnauthenticated,
    /// A principal is signed in but its role is absent or not permitted
    DeniedForbidden,
}

impl Outcome {
    /// Returns `true` for both denial outcomes.
    pub fn is_denied(self) -> bool {
        matches!(self, Outcome::DeniedUnauthenticated | Outcome::DeniedForbidden)
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Granted => write!(f, "granted"),
            Outcome::Pending => write!(f, "pending"),
            Outcome::DeniedUnauthenticated => write!(f, "denied-unauthenticated"),
            Outcome::DeniedForbidden => write!(f, "denied-forbidden"),
        }
    }
}

/// Proof that the gate granted a principal access to a resource.
///
/// It cannot be constructed outside this crate, so a view that requires an
/// `&AccessGrant` can only be rendered after a `granted` decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessGrant {
    resource: String,
    principal_id: String,
    role: Role,
}

impl AccessGrant {
    pub(crate) fn new(resource: &str, principal_id: &str, role: Role) -> Self {
        Self {
            resource: resource.to_string(),
            principal_id: principal_id.to_string(),
            role,
        }
    }

    /// Resource the grant was issued for.
    pub fn resource(&self) -> &str {
        &self.resource
    }

    /// Principal that was granted access.
    pub fn principal_id(&self) -> &str {
        &self.principal_id
    }

    /// Role that satisfied the resource's allowed set.
    pub fn role(&self) -> Role {
        self.role
    }
}

/// The gate's verdict for one navigation attempt. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationDecision {
    requested_resource: String,
    outcome: Outcome,
    redirect: Option<String>,
    grant: Option<AccessGrant>,
}

impl AuthorizationDecision {
    pub(crate) fn pending(resource: &str) -> Self {
        Self::bare(resource, Outcome::Pending, None)
    }

    pub(crate) fn granted(grant: AccessGrant) -> Self {
        Self {
            requested_resource: grant.resource.clone(),
            outcome: Outcome::Granted,
            redirect: None,
            grant: Some(grant),
        }
    }

    pub(crate) fn unauthenticated(resource: &str, sign_in: String) -> Self {
        Self::bare(resource, Outcome::DeniedUnauthenticated, Some(sign_in))
    }

    pub(crate) fn forbidden(resource: &str, not_authorized: &str) -> Self {
        Self::bare(
            resource,
            Outcome::DeniedForbidden,
            Some(not_authorized.to_string()),
        )
    }

    fn bare(resource: &str, outcome: Outcome, redirect: Option<String>) -> Self {
        Self {
            requested_resource: resource.to_string(),
            outcome,
            redirect,
            grant: None,
        }
    }

    /// Resource the caller asked to enter.
    pub fn requested_resource(&self) -> &str {
        &self.requested_resource
    }

    /// The outcome.
    pub fn outcome(&self) -> Outcome {
        self.outcome
    }

    /// Where to send the user on denial. `None` for granted and pending.
    pub fn redirect(&self) -> Option<&str> {
        self.redirect.as_deref()
    }

    /// The access proof, present only when granted.
    pub fn grant(&self) -> Option<&AccessGrant> {
        self.grant.as_ref()
    }

    /// Shorthand for `outcome() == Outcome::Granted`.
    pub fn is_granted(&self) -> bool {
        self.outcome == Outcome::Granted
    }
}
