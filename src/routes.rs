//! Router-side table of protected resources.
//!
//! The gate does not know which roles a resource needs; the router owns that
//! mapping and passes the matching set to
//! [`AuthorizationGate::authorize`](crate::AuthorizationGate::authorize).
//! Paths that match no rule are public and bypass the gate entirely.

use crate::config::{GateConfig, RouteRule};
use crate::decision::AuthorizationDecision;
use crate::error::Error;
use crate::gate::AuthorizationGate;
use crate::role::AllowedRoles;

/// Prefix to allowed-roles mapping with longest-prefix matching.
///
/// # Examples
///
/// ```
/// use portal_gate::{AllowedRoles, Role, RouteTable};
///
/// let table = RouteTable::new()
///     .protect("/dashboard", AllowedRoles::new([Role::Admin, Role::SuperAdmin]).unwrap())
///     .unwrap()
///     .protect("/dashboard/admins", AllowedRoles::new([Role::SuperAdmin]).unwrap())
///     .unwrap();
///
/// assert!(table.lookup("/dashboard/students").unwrap().contains(Role::Admin));
/// assert!(!table.lookup("/dashboard/admins").unwrap().contains(Role::Admin));
/// assert!(table.lookup("/dashboards").is_none());
/// assert!(table.lookup("/login").is_none());
/// ```
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    // Sorted longest prefix first.
    rules: Vec<(String, AllowedRoles)>,
}

impl RouteTable {
    /// Creates an empty table; every path is public.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the table from configured rules.
    pub fn from_rules(rules: &[RouteRule]) -> Result<Self, Error> {
        rules.iter().try_fold(Self::new(), |table, rule| {
            table.protect(rule.prefix.as_str(), rule.allowed()?)
        })
    }

    /// Builds the table from a gate configuration's `routes`.
    pub fn from_config(config: &GateConfig) -> Result<Self, Error> {
        Self::from_rules(&config.routes)
    }

    /// Adds a protected prefix.
    ///
    /// # Errors
    ///
    /// [`Error::Config`] if the prefix is not absolute or is already present.
    pub fn protect(mut self, prefix: impl Into<String>, allowed: AllowedRoles) -> Result<Self, Error> {
        let prefix = normalize(&prefix.into())?;
        if self.rules.iter().any(|(existing, _)| *existing == prefix) {
            return Err(Error::Config(format!("route `{}` is protected twice", prefix)));
        }
        self.rules.push((prefix, allowed));
        self.rules.sort_by(|(a, _), (b, _)| b.len().cmp(&a.len()));
        Ok(self)
    }

    /// Allowed roles for `path`, or `None` if the path is public.
    ///
    /// Query strings and fragments are ignored; prefixes match on whole path
    /// segments.
    pub fn lookup(&self, path: &str) -> Option<&AllowedRoles> {
        let path = path
            .split(|c| c == '?' || c == '#')
            .next()
            .unwrap_or_default();
        self.rules
            .iter()
            .find(|(prefix, _)| covers(prefix, path))
            .map(|(_, allowed)| allowed)
    }

    /// Asks the gate about `path`. `None` means the path is public.
    pub fn evaluate(&self, gate: &AuthorizationGate, path: &str) -> Option<AuthorizationDecision> {
        self.lookup(path).map(|allowed| gate.authorize(path, allowed))
    }

    /// Number of protected prefixes.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Returns `true` when every path is public.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

fn normalize(prefix: &str) -> Result<String, Error> {
    if !prefix.starts_with('/') {
        return Err(Error::Config(format!(
            "route prefix must be an absolute path, got `{}`",
            prefix
        )));
    }
    let trimmed = prefix.trim_end_matches('/');
    Ok(if trimmed.is_empty() { "/" } else { trimmed }.to_string())
}

fn covers(prefix: &str, path: &str) -> bool {
    if prefix == "/" {
        return true;
    }
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}
