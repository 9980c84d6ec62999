//! In-memory audit trail recorder.

use parking_lot::Mutex;

use super::{AuditEvent, AuditEventKind};

/// Thread-safe in-memory recorder for audit events.
///
/// Shared with the gate through an `Arc`. Production deployments would drain
/// it into durable storage.
///
/// # Example
///
/// ```
/// use portal_gate::audit::{AuditEvent, AuditEventKind, AuditOutcome, AuditTrail};
///
/// let trail = AuditTrail::new();
/// trail.record(AuditEvent::new(
///     1,
///     Some("uid-1"),
///     AuditEventKind::SignOut,
///     AuditOutcome::Success,
/// ));
///
/// assert_eq!(trail.len(), 1);
/// ```
#[derive(Debug, Default)]
pub struct AuditTrail {
    events: Mutex<Vec<AuditEvent>>,
}

impl AuditTrail {
    /// Creates a new empty audit trail.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an audit event. Events keep insertion order.
    pub fn record(&self, event: AuditEvent) {
        self.events.lock().push(event);
    }

    /// Returns a snapshot of all recorded events.
    pub fn events(&self) -> Vec<AuditEvent> {
        self.events.lock().clone()
    }

    /// Returns the recorded events of one kind.
    pub fn events_of(&self, kind: AuditEventKind) -> Vec<AuditEvent> {
        self.events
            .lock()
            .iter()
            .filter(|event| event.kind() == kind)
            .cloned()
            .collect()
    }

    /// Returns the number of recorded events.
    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    /// Returns true if no events have been recorded.
    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }

    /// Removes and returns all recorded events.
    pub fn drain(&self) -> Vec<AuditEvent> {
        std::mem::take(&mut *self.events.lock())
    }
}
