//! Audit event schema and types.

use std::fmt;

/// Provisioning defects the gate can observe but not repair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnomalyKind {
    /// Authenticated principal with no usable role
    RolelessPrincipal,
    /// Token role claim disagrees with the durable role record
    ClaimRecordMismatch,
    /// `role` claim present but not a known role
    MalformedRoleClaim,
}

impl fmt::Display for AnomalyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnomalyKind::RolelessPrincipal => write!(f, "roleless_principal"),
            AnomalyKind::ClaimRecordMismatch => write!(f, "claim_record_mismatch"),
            AnomalyKind::MalformedRoleClaim => write!(f, "malformed_role_claim"),
        }
    }
}

/// Kind of audit event being recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditEventKind {
    /// A principal's role was resolved (or the attempt was dropped)
    RoleResolution,
    /// The session ended
    SignOut,
    /// A collaborator call failed during resolution
    TransientFailure,
    /// A provisioning defect was observed
    Anomaly(AnomalyKind),
}

impl fmt::Display for AuditEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuditEventKind::RoleResolution => write!(f, "role_resolution"),
            AuditEventKind::SignOut => write!(f, "sign_out"),
            AuditEventKind::TransientFailure => write!(f, "transient_failure"),
            AuditEventKind::Anomaly(kind) => write!(f, "anomaly:{}", kind),
        }
    }
}

/// Outcome of an audited operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditOutcome {
    /// Operation completed and its result was applied
    Success,
    /// Operation completed but left the principal without access
    Denied,
    /// Operation failed
    Error,
    /// Result arrived after the session moved on and was dropped
    Discarded,
}

impl fmt::Display for AuditOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuditOutcome::Success => write!(f, "success"),
            AuditOutcome::Denied => write!(f, "denied"),
            AuditOutcome::Error => write!(f, "error"),
            AuditOutcome::Discarded => write!(f, "discarded"),
        }
    }
}

/// A structured audit event containing only safe, non-sensitive metadata.
///
/// # Example
///
/// ```
/// use portal_gate::audit::{AnomalyKind, AuditEvent, AuditEventKind, AuditOutcome};
///
/// let event = AuditEvent::new(
///     7,
///     Some("uid-42"),
///     AuditEventKind::Anomaly(AnomalyKind::RolelessPrincipal),
///     AuditOutcome::Denied,
/// )
/// .with_detail("no role claim and no role record");
///
/// assert_eq!(event.epoch(), 7);
/// assert_eq!(event.principal(), Some("uid-42"));
/// assert!(event.to_string().contains("anomaly:roleless_principal"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditEvent {
    epoch: u64,
    principal: Option<String>,
    kind: AuditEventKind,
    outcome: AuditOutcome,
    role: Option<String>,
    detail: Option<String>,
}

impl AuditEvent {
    /// Creates a new audit event with required fields.
    pub fn new(
        epoch: u64,
        principal: Option<impl Into<String>>,
        kind: AuditEventKind,
        outcome: AuditOutcome,
    ) -> Self {
        Self {
            epoch,
            principal: principal.map(Into::into),
            kind,
            outcome,
            role: None,
            detail: None,
        }
    }

    /// Sets the role involved.
    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }

    /// Sets a free-form detail. Must not contain tokens or claim payloads.
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// Session epoch the event belongs to.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Principal identifier, if any.
    pub fn principal(&self) -> Option<&str> {
        self.principal.as_deref()
    }

    /// Event kind.
    pub fn kind(&self) -> AuditEventKind {
        self.kind
    }

    /// Event outcome.
    pub fn outcome(&self) -> AuditOutcome {
        self.outcome
    }

    /// Role involved, if set.
    pub fn role(&self) -> Option<&str> {
        self.role.as_deref()
    }

    /// Detail, if set.
    pub fn detail(&self) -> Option<&str> {
        self.detail.as_deref()
    }
}

impl fmt::Display for AuditEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "AuditEvent[kind={}, outcome={}, epoch={}, principal={}",
            self.kind,
            self.outcome,
            self.epoch,
            self.principal.as_deref().unwrap_or("<none>")
        )?;

        if let Some(role) = &self.role {
            write!(f, ", role={}", role)?;
        }
        if let Some(detail) = &self.detail {
            write!(f, ", detail={}", detail)?;
        }

        write!(f, "]")
    }
}
