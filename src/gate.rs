use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures_util::stream::{FuturesUnordered, StreamExt};
use parking_lot::Mutex;

use crate::audit::{AnomalyKind, AuditEvent, AuditEventKind, AuditOutcome, AuditTrail};
use crate::config::GateConfig;
use crate::decision::{AccessGrant, AuthorizationDecision};
use crate::error::{Error, ProviderError};
use crate::logging::SessionLog;
use crate::principal::{Principal, RoleClaim, SessionEvent};
use crate::provider::{IdentityProvider, ProfileStore};
use crate::role::{AllowedRoles, Role};
use crate::state::{ResolutionKey, SessionSnapshot, SessionState};

/// Callback invoked with the settled session after every change.
pub type SessionListener = Arc<dyn Fn(&SessionSnapshot) + Send + Sync>;

/// Handle returned by [`AuthorizationGate::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

#[derive(Default)]
struct Subscribers {
    next_id: u64,
    listeners: Vec<(SubscriptionId, SessionListener)>,
}

/// Work left to do for a session event once its epoch has been taken.
struct Ticket {
    epoch: u64,
    principal: Principal,
    refresh: bool,
}

/// Where a resolved role (or its absence) came from.
#[derive(Clone, Copy)]
enum Basis {
    Claim,
    NoRecord,
    Reissued,
}

impl Basis {
    fn describe(self, role: Option<Role>) -> &'static str {
        match (self, role) {
            (Basis::Claim, _) => "from token claim",
            (Basis::Reissued, Some(_)) => "from reissued token claim",
            (Basis::Reissued, None) => "role record exists but the reissued token has no role claim",
            (Basis::NoRecord, _) => "no role claim and no role record",
        }
    }
}

enum Resolution {
    Resolved {
        principal: Principal,
        role: Option<Role>,
        basis: Basis,
    },
    Failed(ProviderError),
}

impl Resolution {
    fn role(&self) -> Option<Role> {
        match self {
            Resolution::Resolved { role, .. } => *role,
            Resolution::Failed(_) => None,
        }
    }
}

/// The role-resolution and route-authorization gate.
///
/// One gate exists per signed-in client session. It is built by the
/// application's composition root and handed to the router, which calls
/// [`authorize`](Self::authorize) on every navigation and re-evaluates when a
/// [`subscribe`](Self::subscribe)d listener fires.
///
/// The token's `role` claim is the only source of truth for decisions. The
/// profile store is consulted for diagnostics and never grants access.
///
/// Every accepted session event bumps a session epoch. A role resolution is
/// applied only if the epoch it started under is still current, so a late
/// result can never overwrite a newer sign-out.
///
/// # Examples
///
/// ```no_run
/// # use std::sync::Arc;
/// # use portal_gate::{AuthorizationGate, AllowedRoles, GateConfig, IdentityProvider, ProfileStore, Role};
/// # async fn example(identity: Arc<dyn IdentityProvider>, profiles: Arc<dyn ProfileStore>) {
/// let gate = Arc::new(
///     AuthorizationGate::builder(identity, profiles)
///         .config(GateConfig::default())
///         .build()
///         .expect("valid configuration"),
/// );
///
/// tokio::spawn(Arc::clone(&gate).run());
///
/// let admins = AllowedRoles::new([Role::Admin, Role::SuperAdmin]).unwrap();
/// let decision = gate.authorize("/dashboard", &admins);
/// # }
/// ```
pub struct AuthorizationGate {
    identity: Arc<dyn IdentityProvider>,
    profiles: Arc<dyn ProfileStore>,
    config: GateConfig,
    audit: Option<Arc<AuditTrail>>,
    state: Mutex<SessionState>,
    subscribers: Mutex<Subscribers>,
}

/// Builder for [`AuthorizationGate`].
pub struct GateBuilder {
    identity: Arc<dyn IdentityProvider>,
    profiles: Arc<dyn ProfileStore>,
    config: GateConfig,
    audit: Option<Arc<AuditTrail>>,
}

impl GateBuilder {
    /// Replaces the default configuration.
    pub fn config(mut self, config: GateConfig) -> Self {
        self.config = config;
        self
    }

    /// Records session and resolution events into `trail`.
    pub fn audit(mut self, trail: Arc<AuditTrail>) -> Self {
        self.audit = Some(trail);
        self
    }

    /// Validates the configuration and builds the gate.
    ///
    /// # Errors
    ///
    /// Returns the configuration's validation error.
    pub fn build(self) -> Result<AuthorizationGate, Error> {
        self.config.validate()?;
        Ok(AuthorizationGate {
            identity: self.identity,
            profiles: self.profiles,
            config: self.config,
            audit: self.audit,
            state: Mutex::new(SessionState::awaiting_first_event()),
            subscribers: Mutex::new(Subscribers::default()),
        })
    }
}

impl AuthorizationGate {
    /// Starts building a gate over the two collaborators.
    pub fn builder(
        identity: Arc<dyn IdentityProvider>,
        profiles: Arc<dyn ProfileStore>,
    ) -> GateBuilder {
        GateBuilder {
            identity,
            profiles,
            config: GateConfig::default(),
            audit: None,
        }
    }

    /// Creates a gate with the default configuration and no audit trail.
    ///
    /// The gate reports `pending` until it sees its first session event.
    pub fn new(identity: Arc<dyn IdentityProvider>, profiles: Arc<dyn ProfileStore>) -> Self {
        Self {
            identity,
            profiles,
            config: GateConfig::default(),
            audit: None,
            state: Mutex::new(SessionState::awaiting_first_event()),
            subscribers: Mutex::new(Subscribers::default()),
        }
    }

    /// The gate's configuration.
    pub fn config(&self) -> &GateConfig {
        &self.config
    }

    /// Current session as seen by the gate.
    pub fn snapshot(&self) -> SessionSnapshot {
        self.state.lock().snapshot()
    }

    // ------------------------------------------------------------------
    // Session changes
    // ------------------------------------------------------------------

    /// Handles a notification from the identity provider.
    ///
    /// A sign-out settles immediately. A sign-in marks the gate as resolving,
    /// forces a token refresh, stores the refreshed principal and resolves its
    /// role. Collaborator failures are logged and leave the gate without a
    /// principal; they are never returned to the caller.
    pub async fn on_session_change(&self, event: SessionEvent) {
        self.dispatch(event).await
    }

    /// Takes the event's epoch now and returns the remaining resolution work.
    ///
    /// The epoch is claimed before the returned future is first polled, so
    /// events dispatched in order keep that order even when their resolutions
    /// run concurrently.
    pub fn dispatch(&self, event: SessionEvent) -> impl Future<Output = ()> + Send + '_ {
        let ticket = self.begin(event);
        async move {
            if let Some(ticket) = ticket {
                self.settle(ticket).await;
            }
        }
    }

    /// Seeds the gate from the provider's cached principal.
    pub async fn start(&self) {
        let event = self.current_session_event();
        self.dispatch(event).await
    }

    /// Re-runs resolution for the provider's current principal, forcing a
    /// token refresh. Use after an administrator changes a role.
    pub async fn refresh(&self) {
        self.start().await
    }

    /// Drives the gate from the provider's event stream until it closes.
    ///
    /// The initial state is seeded from the provider's cached principal.
    /// Resolutions stay in flight while later events are accepted, so a
    /// sign-out is never queued behind a slow sign-in.
    pub async fn run(self: Arc<Self>) {
        let mut events = self.identity.subscribe();
        let mut inflight = FuturesUnordered::new();
        inflight.push(self.dispatch(self.current_session_event()));

        loop {
            tokio::select! {
                biased;
                event = events.recv() => match event {
                    Some(event) => inflight.push(self.dispatch(event)),
                    None => break,
                },
                Some(()) = inflight.next(), if !inflight.is_empty() => {}
            }
        }

        while inflight.next().await.is_some() {}
        tracing::debug!("identity provider event stream closed");
    }

    /// Signs the principal out.
    ///
    /// Local state is cleared before the provider is asked to invalidate the
    /// session, so once this is called no `granted` decision can be produced
    /// for the old session and any in-flight resolution is discarded.
    pub async fn sign_out(&self) {
        self.end_session();
        if let Err(err) = self.identity.sign_out().await {
            tracing::warn!(error = %err, "identity provider failed to invalidate session");
        }
    }

    /// Resolves the role of `principal` from its token claim.
    ///
    /// Falls back to the profile store only when the claim is unusable, and
    /// then only to detect stale tokens; the store's record never becomes the
    /// role. Repeated calls for the same principal and claims return the
    /// cached role without further lookups or notifications.
    ///
    /// Claims passed in are not trusted: the token is refreshed first and
    /// only the refreshed claims are resolved. The result is applied to the
    /// gate only when `principal` is the gate's settled current principal
    /// and no session change happened meanwhile.
    pub async fn resolve_role(&self, principal: &Principal) -> Option<Role> {
        let (epoch, owned) = {
            let state = self.state.lock();
            if !state.resolving
                && state.resolved_for.as_ref() == Some(&ResolutionKey::of(principal))
            {
                return state.role;
            }
            let owned = !state.resolving && state.principal_id() == Some(principal.id.as_str());
            (state.epoch, owned)
        };

        let resolution = match self.refreshed(principal).await {
            Ok(refreshed) => self.resolve(epoch, refreshed).await,
            Err(err) => Resolution::Failed(err),
        };
        if owned {
            self.apply(epoch, &principal.id, resolution)
        } else {
            resolution.role()
        }
    }

    // ------------------------------------------------------------------
    // Decisions
    // ------------------------------------------------------------------

    /// Decides whether the current principal may enter `resource`.
    ///
    /// Synchronous and free of I/O. While a resolution is in flight the
    /// outcome is `pending`; callers render a waiting state and re-evaluate
    /// when notified.
    pub fn authorize(&self, resource: &str, allowed: &AllowedRoles) -> AuthorizationDecision {
        let state = self.state.lock();
        if state.resolving {
            return AuthorizationDecision::pending(resource);
        }

        let Some(principal) = state.principal.as_ref() else {
            return AuthorizationDecision::unauthenticated(
                resource,
                self.config.sign_in_redirect(resource),
            );
        };

        let log = SessionLog::new(state.epoch, Some(&principal.id));
        match state.role {
            Some(role) if allowed.contains(role) => {
                AuthorizationDecision::granted(AccessGrant::new(resource, &principal.id, role))
            }
            Some(role) => {
                log.info(format_args!(
                    "role {} not permitted for {} (allowed: {})",
                    role, resource, allowed
                ));
                AuthorizationDecision::forbidden(resource, &self.config.unauthorized_route)
            }
            None => {
                log.warn(format_args!(
                    "authenticated principal has no role, denying {}; role was never provisioned",
                    resource
                ));
                AuthorizationDecision::forbidden(resource, &self.config.unauthorized_route)
            }
        }
    }

    /// Landing resource for the resolved role.
    ///
    /// # Errors
    ///
    /// [`Error::UnmappedRole`] when no role is resolved, including the raw
    /// claim value when the token carried an unknown role.
    pub fn landing_route(&self) -> Result<String, Error> {
        let state = self.state.lock();
        let landing = &self.config.landing;
        match (state.role, state.principal.as_ref()) {
            (Some(role), _) if !state.resolving => Ok(landing.for_role(role).to_string()),
            (_, Some(principal)) if !state.resolving => landing
                .for_claim(&principal.role_claim())
                .map(str::to_string),
            _ => Err(Error::UnmappedRole(None)),
        }
    }

    // ------------------------------------------------------------------
    // Subscriptions
    // ------------------------------------------------------------------

    /// Registers a listener called after every settled session change.
    ///
    /// Listeners run on the task that settled the change, outside the gate's
    /// lock, so they may call back into the gate.
    pub fn subscribe<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(&SessionSnapshot) + Send + Sync + 'static,
    {
        let mut subscribers = self.subscribers.lock();
        subscribers.next_id += 1;
        let id = SubscriptionId(subscribers.next_id);
        subscribers.listeners.push((id, Arc::new(listener)));
        id
    }

    /// Removes a listener. Returns `false` if it was not registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subscribers = self.subscribers.lock();
        let before = subscribers.listeners.len();
        subscribers.listeners.retain(|(existing, _)| *existing != id);
        subscribers.listeners.len() != before
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn current_session_event(&self) -> SessionEvent {
        match self.identity.current_principal() {
            Some(principal) => SessionEvent::SignedIn(principal),
            None => SessionEvent::SignedOut,
        }
    }

    fn begin(&self, event: SessionEvent) -> Option<Ticket> {
        let (principal, forced) = match event {
            SessionEvent::SignedOut => {
                self.end_session();
                return None;
            }
            SessionEvent::SignedIn(principal) => (principal, true),
            SessionEvent::TokenRefreshed(principal) => (principal, false),
        };

        let mut state = self.state.lock();
        let same_principal = state.principal_id() == Some(principal.id.as_str());
        if !forced
            && !state.resolving
            && state.resolved_for.as_ref() == Some(&ResolutionKey::of(&principal))
        {
            // Renewed token, unchanged claims: keep the resolved role.
            state.principal = Some(principal);
            return None;
        }

        state.epoch += 1;
        state.principal = Some(principal.clone());
        state.role = None;
        state.resolving = true;
        state.resolved_for = None;
        let epoch = state.epoch;
        drop(state);

        let refresh = forced || !same_principal;
        SessionLog::new(epoch, Some(&principal.id)).info(format_args!(
            "session changed, resolving role{}",
            if refresh { " after token refresh" } else { "" }
        ));
        Some(Ticket {
            epoch,
            principal,
            refresh,
        })
    }

    fn end_session(&self) {
        let mut state = self.state.lock();
        if state.principal.is_none() && !state.resolving {
            return;
        }
        let previous = state.principal.as_ref().map(|p| p.id.clone());
        state.epoch += 1;
        state.clear();
        let snapshot = state.snapshot();
        drop(state);

        SessionLog::new(snapshot.epoch, previous.as_deref())
            .info(format_args!("session signed out"));
        if previous.is_some() {
            self.record(AuditEvent::new(
                snapshot.epoch,
                previous,
                AuditEventKind::SignOut,
                AuditOutcome::Success,
            ));
        }
        self.notify(&snapshot);
    }

    async fn settle(&self, ticket: Ticket) {
        let Ticket {
            epoch,
            principal,
            refresh,
        } = ticket;
        let id = principal.id.clone();

        let principal = if refresh {
            match self.refreshed(&principal).await {
                Ok(refreshed) => refreshed,
                Err(err) => {
                    self.apply(epoch, &id, Resolution::Failed(err));
                    return;
                }
            }
        } else {
            principal
        };

        let current = {
            let mut state = self.state.lock();
            let current = state.epoch == epoch;
            if current {
                state.principal = Some(principal.clone());
            }
            current
        };
        if !current {
            self.discard(epoch, &id);
            return;
        }

        let resolution = self.resolve(epoch, principal).await;
        self.apply(epoch, &id, resolution);
    }

    async fn resolve(&self, epoch: u64, principal: Principal) -> Resolution {
        match principal.role_claim() {
            RoleClaim::Valid(role) if self.config.corroborate_claims => {
                self.corroborate(epoch, principal, role).await
            }
            RoleClaim::Valid(role) => Resolution::Resolved {
                principal,
                role: Some(role),
                basis: Basis::Claim,
            },
            RoleClaim::Malformed(raw) => {
                self.anomaly(
                    epoch,
                    &principal.id,
                    AnomalyKind::MalformedRoleClaim,
                    AuditOutcome::Denied,
                    format!("role claim `{}` is not a known role", raw),
                );
                self.fallback(epoch, principal).await
            }
            RoleClaim::Missing => self.fallback(epoch, principal).await,
        }
    }

    /// The token has no usable claim. A role record then means the token is
    /// stale, so it is reissued once; the record itself never grants.
    async fn fallback(&self, epoch: u64, principal: Principal) -> Resolution {
        let record = match self.profiles.role_record(&principal.id).await {
            Ok(record) => record,
            Err(err) => return Resolution::Failed(err),
        };
        let Some(record) = record else {
            return Resolution::Resolved {
                principal,
                role: None,
                basis: Basis::NoRecord,
            };
        };

        self.anomaly(
            epoch,
            &principal.id,
            AnomalyKind::ClaimRecordMismatch,
            AuditOutcome::Success,
            format!(
                "token has no usable role claim but the role record says {}; reissuing token",
                record.role
            ),
        );
        self.reissue(principal).await
    }

    async fn corroborate(&self, epoch: u64, principal: Principal, role: Role) -> Resolution {
        match self.profiles.role_record(&principal.id).await {
            Ok(Some(record)) if record.role != role => {
                self.anomaly(
                    epoch,
                    &principal.id,
                    AnomalyKind::ClaimRecordMismatch,
                    AuditOutcome::Success,
                    format!(
                        "token claims {} but the role record says {}; reissuing token",
                        role, record.role
                    ),
                );
                self.reissue(principal).await
            }
            Ok(_) => Resolution::Resolved {
                principal,
                role: Some(role),
                basis: Basis::Claim,
            },
            Err(err) => {
                SessionLog::new(epoch, Some(&principal.id)).warn(format_args!(
                    "role record lookup failed, keeping token claim: {}",
                    err
                ));
                Resolution::Resolved {
                    principal,
                    role: Some(role),
                    basis: Basis::Claim,
                }
            }
        }
    }

    async fn reissue(&self, principal: Principal) -> Resolution {
        match self.refreshed(&principal).await {
            Ok(refreshed) => {
                let role = refreshed.role_claim().role();
                Resolution::Resolved {
                    principal: refreshed,
                    role,
                    basis: Basis::Reissued,
                }
            }
            Err(err) => Resolution::Failed(err),
        }
    }

    /// Forces a token refresh, rejecting a token issued to anyone else.
    async fn refreshed(&self, principal: &Principal) -> Result<Principal, ProviderError> {
        let refreshed = self.identity.force_refresh(principal).await?;
        if refreshed.id != principal.id {
            return Err(ProviderError::Rejected(format!(
                "token refresh for {} returned principal {}",
                principal.id, refreshed.id
            )));
        }
        Ok(refreshed)
    }

    fn apply(&self, epoch: u64, principal_id: &str, resolution: Resolution) -> Option<Role> {
        let role = resolution.role();
        let mut state = self.state.lock();
        if state.epoch != epoch || state.principal_id() != Some(principal_id) {
            drop(state);
            self.discard(epoch, principal_id);
            return role;
        }

        let log = SessionLog::new(epoch, Some(principal_id));
        match resolution {
            Resolution::Resolved {
                principal,
                role,
                basis,
            } => {
                state.resolved_for = Some(ResolutionKey::of(&principal));
                state.principal = Some(principal);
                state.role = role;
                state.resolving = false;
                let snapshot = state.snapshot();
                drop(state);

                match role {
                    Some(role) => {
                        log.info(format_args!("resolved role {}", role));
                        self.record(
                            AuditEvent::new(
                                epoch,
                                Some(principal_id),
                                AuditEventKind::RoleResolution,
                                AuditOutcome::Success,
                            )
                            .with_role(role.as_str())
                            .with_detail(basis.describe(Some(role))),
                        );
                    }
                    None => self.anomaly(
                        epoch,
                        principal_id,
                        AnomalyKind::RolelessPrincipal,
                        AuditOutcome::Denied,
                        basis.describe(None).to_string(),
                    ),
                }
                self.notify(&snapshot);
            }
            Resolution::Failed(err) => {
                state.clear();
                let snapshot = state.snapshot();
                drop(state);

                log.error(format_args!("role resolution failed: {}", err));
                self.record(
                    AuditEvent::new(
                        epoch,
                        Some(principal_id),
                        AuditEventKind::TransientFailure,
                        AuditOutcome::Error,
                    )
                    .with_detail(err.to_string()),
                );
                self.notify(&snapshot);
            }
        }
        role
    }

    fn discard(&self, epoch: u64, principal_id: &str) {
        SessionLog::new(epoch, Some(principal_id))
            .debug(format_args!("discarding stale role resolution"));
        self.record(AuditEvent::new(
            epoch,
            Some(principal_id),
            AuditEventKind::RoleResolution,
            AuditOutcome::Discarded,
        ));
    }

    fn anomaly(
        &self,
        epoch: u64,
        principal_id: &str,
        kind: AnomalyKind,
        outcome: AuditOutcome,
        detail: String,
    ) {
        SessionLog::new(epoch, Some(principal_id))
            .warn(format_args!("provisioning anomaly {}: {}", kind, detail));
        self.record(
            AuditEvent::new(
                epoch,
                Some(principal_id),
                AuditEventKind::Anomaly(kind),
                outcome,
            )
            .with_detail(detail),
        );
    }

    fn record(&self, event: AuditEvent) {
        if let Some(trail) = &self.audit {
            trail.record(event);
        }
    }

    fn notify(&self, snapshot: &SessionSnapshot) {
        let listeners: Vec<SessionListener> = self
            .subscribers
            .lock()
            .listeners
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();
        for listener in listeners {
            listener(snapshot);
        }
    }
}

impl fmt::Debug for AuthorizationGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthorizationGate")
            .field("session", &self.snapshot())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
