//! Contracts for the external collaborators the gate consumes.
//!
//! Both are black boxes: the identity provider owns sessions and token
//! verification, the profile store owns durable role records. Implementations
//! must be `Send + Sync` so a gate can be shared across tasks.

use async_trait::async_trait;
use tokio::sync::mpsc::UnboundedReceiver;

use crate::error::ProviderError;
use crate::principal::{Principal, SessionEvent};
use crate::role::RoleAssignment;

/// Source of authenticated sessions.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Registers for session notifications.
    ///
    /// Events must arrive on the returned channel in the order the provider
    /// observed them. The stream ends when the provider shuts down.
    fn subscribe(&self) -> UnboundedReceiver<SessionEvent>;

    /// Returns the active principal from the provider's local cache.
    fn current_principal(&self) -> Option<Principal>;

    /// Re-verifies the principal with the remote authority and returns it
    /// with a freshly issued token and claims.
    async fn force_refresh(&self, principal: &Principal) -> Result<Principal, ProviderError>;

    /// Invalidates the session remotely and locally.
    async fn sign_out(&self) -> Result<(), ProviderError>;
}

/// Durable store of role assignments.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Looks up the role record for a principal. `Ok(None)` means not found.
    async fn role_record(&self, principal_id: &str)
        -> Result<Option<RoleAssignment>, ProviderError>;
}
