//! Audit trail for session and role-resolution events.
//!
//! This module provides:
//! - `AuditEvent`: Structured record of a security-relevant gate event
//! - `AuditEventKind` / `AnomalyKind`: What happened
//! - `AuditOutcome`: How it ended
//! - `AuditTrail`: In-memory, thread-safe recorder
//!
//! Audit events carry identifiers and role names only. Session tokens and
//! claim payloads are never recorded.

mod event;
mod trail;

pub use event::{AnomalyKind, AuditEvent, AuditEventKind, AuditOutcome};
pub use trail::AuditTrail;
