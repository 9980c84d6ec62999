use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while configuring or consulting the gate.
///
/// Session-driven failures never surface here: the gate converts them into
/// state. These variants cover caller mistakes and configuration faults.
#[derive(Debug, Error)]
pub enum Error {
    /// An allowed-roles set was empty or named an unknown role
    #[error("invalid allowed-roles set: {0}")]
    InvalidRoles(#[from] InvalidRoles),

    /// Configuration values failed validation
    #[error("invalid gate configuration: {0}")]
    Config(String),

    /// Configuration file could not be read
    #[error("failed to read configuration from {path}: {source}")]
    ConfigIo {
        /// Path that was being read
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Configuration text was not valid JSON for `GateConfig`
    #[error("failed to parse configuration: {0}")]
    ConfigParse(#[from] serde_json::Error),

    /// The resolved role (or its absence) has no landing resource
    #[error("no landing resource for role {}", .0.as_deref().unwrap_or("<none>"))]
    UnmappedRole(Option<String>),
}

/// A role string that is not one of the known roles.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown role `{0}`")]
pub struct ParseRoleError(pub String);

/// Reasons an allowed-roles set is rejected.
///
/// These are router configuration bugs, so they are reported when the set is
/// built rather than turned into a denial at navigation time.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidRoles {
    /// No roles were supplied
    #[error("allowed-roles set is empty")]
    Empty,
    /// A role value could not be parsed
    #[error(transparent)]
    Unknown(#[from] ParseRoleError),
}

/// Failures reported by the identity provider or the profile store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    /// The remote authority could not be reached
    #[error("network error: {0}")]
    Network(String),
    /// The remote authority refused the credentials
    #[error("credentials rejected: {0}")]
    Rejected(String),
    /// There is no active session to act on
    #[error("no active session")]
    NoSession,
}
