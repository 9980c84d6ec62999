//! Test doubles for the gate's collaborators.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use portal_gate::audit::AuditTrail;
use portal_gate::{
    AllowedRoles, AuthorizationGate, Claims, GateConfig, IdentityProvider, Principal,
    ProfileStore, ProviderError, Role, RoleAssignment, SessionEvent, SessionToken,
};
use tokio::sync::{mpsc, Notify, Semaphore};

/// Identity provider whose refreshes can be held, failed, or scripted.
#[derive(Default)]
pub struct FakeIdentity {
    issued: Mutex<HashMap<String, VecDeque<Claims>>>,
    current: Mutex<Option<Principal>>,
    answer_as: Mutex<HashMap<usize, String>>,
    hold: Mutex<Option<Arc<Semaphore>>>,
    listeners: Mutex<Vec<mpsc::UnboundedSender<SessionEvent>>>,
    fail_refresh: AtomicBool,
    fail_sign_out: AtomicBool,
    refresh_calls: AtomicUsize,
    sign_out_calls: AtomicUsize,
    /// Signalled each time a refresh starts
    pub refresh_started: Notify,
}

impl FakeIdentity {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Claims the remote authority issues for `id` on every refresh.
    pub fn issue(&self, id: &str, claims: Claims) {
        self.issue_sequence(id, [claims]);
    }

    /// Claims issued on successive refreshes; the last one repeats.
    pub fn issue_sequence(&self, id: &str, claims: impl IntoIterator<Item = Claims>) {
        self.issued
            .lock()
            .insert(id.to_string(), claims.into_iter().collect());
    }

    /// Makes the `call`-th refresh (counting from 1) return a token issued
    /// to `id` instead of the principal being refreshed.
    pub fn answer_refresh_as(&self, call: usize, id: &str) {
        self.answer_as.lock().insert(call, id.to_string());
    }

    /// Sets the cached principal without emitting an event.
    pub fn set_current(&self, principal: Option<Principal>) {
        *self.current.lock() = principal;
    }

    /// Sends an event to every subscriber.
    pub fn emit(&self, event: SessionEvent) {
        self.listeners
            .lock()
            .retain(|listener| listener.send(event.clone()).is_ok());
    }

    /// Ends every subscription stream.
    pub fn close(&self) {
        self.listeners.lock().clear();
    }

    /// Makes refreshes wait for a permit on the returned semaphore.
    pub fn hold_refreshes(&self) -> Arc<Semaphore> {
        let semaphore = Arc::new(Semaphore::new(0));
        *self.hold.lock() = Some(Arc::clone(&semaphore));
        semaphore
    }

    pub fn fail_refreshes(&self, fail: bool) {
        self.fail_refresh.store(fail, Ordering::SeqCst);
    }

    pub fn fail_sign_outs(&self, fail: bool) {
        self.fail_sign_out.store(fail, Ordering::SeqCst);
    }

    pub fn refresh_calls(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }

    pub fn sign_out_calls(&self) -> usize {
        self.sign_out_calls.load(Ordering::SeqCst)
    }

    fn next_claims(&self, id: &str, principal: &Principal) -> Claims {
        let mut issued = self.issued.lock();
        match issued.get_mut(id) {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap_or_default(),
            Some(queue) => queue.front().cloned().unwrap_or_default(),
            None => principal.claims.clone(),
        }
    }
}

#[async_trait]
impl IdentityProvider for FakeIdentity {
    fn subscribe(&self) -> mpsc::UnboundedReceiver<SessionEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.listeners.lock().push(tx);
        rx
    }

    fn current_principal(&self) -> Option<Principal> {
        self.current.lock().clone()
    }

    async fn force_refresh(&self, principal: &Principal) -> Result<Principal, ProviderError> {
        let call = self.refresh_calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.refresh_started.notify_one();

        let hold = self.hold.lock().clone();
        if let Some(semaphore) = hold {
            semaphore
                .acquire()
                .await
                .expect("hold semaphore is never closed")
                .forget();
        }

        if self.fail_refresh.load(Ordering::SeqCst) {
            return Err(ProviderError::Network("token endpoint unreachable".into()));
        }

        let id = self
            .answer_as
            .lock()
            .remove(&call)
            .unwrap_or_else(|| principal.id.clone());
        let claims = self.next_claims(&id, principal);
        Ok(Principal::new(
            id.clone(),
            format!("{}@greenfield.test", id),
            SessionToken::new(format!("{}-refresh-{}", id, call)),
            claims,
        ))
    }

    async fn sign_out(&self) -> Result<(), ProviderError> {
        self.sign_out_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_sign_out.load(Ordering::SeqCst) {
            return Err(ProviderError::Network("revocation endpoint unreachable".into()));
        }
        *self.current.lock() = None;
        self.emit(SessionEvent::SignedOut);
        Ok(())
    }
}

/// Profile store backed by a map, counting lookups.
#[derive(Default)]
pub struct FakeProfiles {
    records: Mutex<HashMap<String, RoleAssignment>>,
    fail: AtomicBool,
    lookups: AtomicUsize,
}

impl FakeProfiles {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn assign(&self, id: &str, role: Role) {
        self.records
            .lock()
            .insert(id.to_string(), RoleAssignment::new(id, role));
    }

    pub fn fail_lookups(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProfileStore for FakeProfiles {
    async fn role_record(
        &self,
        principal_id: &str,
    ) -> Result<Option<RoleAssignment>, ProviderError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(ProviderError::Network("profile store unavailable".into()));
        }
        Ok(self.records.lock().get(principal_id).cloned())
    }
}

/// Everything a scenario needs, wired together.
pub struct Harness {
    pub identity: Arc<FakeIdentity>,
    pub profiles: Arc<FakeProfiles>,
    pub audit: Arc<AuditTrail>,
    pub gate: Arc<AuthorizationGate>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(GateConfig::default())
    }

    pub fn with_config(config: GateConfig) -> Self {
        let identity = FakeIdentity::new();
        let profiles = FakeProfiles::new();
        let audit = Arc::new(AuditTrail::new());
        let gate = AuthorizationGate::builder(identity.clone(), profiles.clone())
            .config(config)
            .audit(Arc::clone(&audit))
            .build()
            .expect("test configuration is valid");
        Self {
            identity,
            profiles,
            audit,
            gate: Arc::new(gate),
        }
    }
}

pub fn principal(id: &str, role: Option<Role>) -> Principal {
    let claims = match role {
        Some(role) => Claims::new().with_role(role),
        None => Claims::new(),
    };
    Principal::new(
        id,
        format!("{}@greenfield.test", id),
        SessionToken::new(format!("{}-initial", id)),
        claims,
    )
}

pub fn roles(list: &[Role]) -> AllowedRoles {
    AllowedRoles::new(list.iter().copied()).expect("non-empty role list")
}

pub fn admins() -> AllowedRoles {
    roles(&[Role::Admin, Role::SuperAdmin])
}
