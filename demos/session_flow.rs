//! Session flow demonstration.
//!
//! This example walks the gate through a portal session:
//! 1. Start the gate against an in-memory identity provider
//! 2. Sign in a teacher and evaluate a few routes
//! 3. Sign in a staff member whose token lacks a role claim
//! 4. Sign out and inspect the audit trail
//!
//! Run with: `RUST_LOG=portal_gate=debug cargo run --example session_flow`

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use portal_gate::{
    audit::AuditTrail, AuthorizationGate, Claims, GateConfig, IdentityProvider, Principal,
    ProfileStore, ProviderError, Role, RoleAssignment, RouteTable, SessionEvent, SessionToken,
};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

/// Identity provider whose token endpoint issues claims from a lookup table.
#[derive(Default)]
struct InMemoryIdentity {
    issued_roles: Mutex<HashMap<String, Role>>,
    listeners: Mutex<Vec<mpsc::UnboundedSender<SessionEvent>>>,
    refreshes: Mutex<u32>,
}

impl InMemoryIdentity {
    fn emit(&self, event: SessionEvent) {
        self.listeners
            .lock()
            .retain(|listener| listener.send(event.clone()).is_ok());
    }
}

#[async_trait]
impl IdentityProvider for InMemoryIdentity {
    fn subscribe(&self) -> mpsc::UnboundedReceiver<SessionEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.listeners.lock().push(tx);
        rx
    }

    fn current_principal(&self) -> Option<Principal> {
        None
    }

    async fn force_refresh(&self, principal: &Principal) -> Result<Principal, ProviderError> {
        let serial = {
            let mut refreshes = self.refreshes.lock();
            *refreshes += 1;
            *refreshes
        };
        let claims = match self.issued_roles.lock().get(&principal.id) {
            Some(role) => Claims::new().with_role(*role),
            None => Claims::new(),
        };
        Ok(Principal::new(
            principal.id.clone(),
            principal.email.clone(),
            SessionToken::new(format!("token-{}", serial)),
            claims,
        ))
    }

    async fn sign_out(&self) -> Result<(), ProviderError> {
        self.emit(SessionEvent::SignedOut);
        Ok(())
    }
}

/// Profile store holding role records written by the admin console.
#[derive(Default)]
struct InMemoryProfiles {
    records: Mutex<HashMap<String, RoleAssignment>>,
}

#[async_trait]
impl ProfileStore for InMemoryProfiles {
    async fn role_record(
        &self,
        principal_id: &str,
    ) -> Result<Option<RoleAssignment>, ProviderError> {
        Ok(self.records.lock().get(principal_id).cloned())
    }
}

fn signed_in(id: &str) -> SessionEvent {
    SessionEvent::SignedIn(Principal::new(
        id,
        format!("{}@greenfield.test", id),
        SessionToken::new("token-0"),
        Claims::new(),
    ))
}

fn show(routes: &RouteTable, gate: &AuthorizationGate, paths: &[&str]) {
    for path in paths {
        match routes.evaluate(gate, path) {
            Some(decision) => println!(
                "   {:<24} {:<22} {}",
                path,
                decision.outcome().to_string(),
                decision.redirect().unwrap_or("")
            ),
            None => println!("   {:<24} public", path),
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("=== Session Flow Example ===\n");

    let identity = Arc::new(InMemoryIdentity::default());
    let profiles = Arc::new(InMemoryProfiles::default());
    let audit = Arc::new(AuditTrail::new());

    identity
        .issued_roles
        .lock()
        .insert("ms-okafor".to_string(), Role::Teacher);
    // Provisioned in the store, but the token endpoint has not caught up.
    profiles.records.lock().insert(
        "mr-lindqvist".to_string(),
        RoleAssignment::new("mr-lindqvist", Role::Admin),
    );

    let config = GateConfig::default();
    let routes = RouteTable::from_config(&config)?;
    let gate = Arc::new(
        AuthorizationGate::builder(identity.clone(), profiles.clone())
            .config(config)
            .audit(Arc::clone(&audit))
            .build()?,
    );

    println!("--- Before the first session event ---");
    show(&routes, &gate, &["/teacher"]);

    gate.start().await;

    println!("\n--- Signed out ---");
    show(&routes, &gate, &["/dashboard/reports", "/about"]);

    println!("\n--- Teacher signs in ---");
    gate.dispatch(signed_in("ms-okafor")).await;
    println!("   landing: {}", gate.landing_route()?);
    show(
        &routes,
        &gate,
        &["/teacher/attendance", "/student/grades", "/dashboard"],
    );

    println!("\n--- Staff member with a stale token signs in ---");
    gate.dispatch(signed_in("mr-lindqvist")).await;
    show(&routes, &gate, &["/dashboard"]);
    match gate.landing_route() {
        Ok(route) => println!("   landing: {}", route),
        Err(err) => println!("   no landing route: {}", err),
    }

    println!("\n--- Sign out ---");
    gate.sign_out().await;
    show(&routes, &gate, &["/teacher"]);

    println!("\n--- Audit trail ({} events) ---", audit.len());
    for event in audit.events() {
        println!("   {}", event);
    }

    Ok(())
}
