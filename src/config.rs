//! Gate configuration.
//!
//! Loaded from JSON. Every field has a default matching the school portal, so
//! an empty object (`{}`) is a valid configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::landing::LandingRoutes;
use crate::role::AllowedRoles;

/// One protected route rule: every path under `prefix` requires one of
/// `allowed_roles`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RouteRule {
    /// Path prefix, matched on segment boundaries
    pub prefix: String,
    /// Role names permitted under the prefix
    pub allowed_roles: Vec<String>,
}

impl RouteRule {
    /// Creates a rule from a prefix and role names.
    pub fn new<'a>(prefix: impl Into<String>, roles: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            prefix: prefix.into(),
            allowed_roles: roles.into_iter().map(str::to_string).collect(),
        }
    }

    /// Parses the role names into a validated set.
    pub fn allowed(&self) -> Result<AllowedRoles, Error> {
        Ok(AllowedRoles::parse(
            self.allowed_roles.iter().map(String::as_str),
        )?)
    }
}

/// Configuration for an [`AuthorizationGate`](crate::AuthorizationGate).
///
/// # Examples
///
/// ```
/// use portal_gate::GateConfig;
///
/// let config = GateConfig::from_json_str(r#"{ "sign_in_route": "/signin" }"#).unwrap();
/// assert_eq!(config.sign_in_route, "/signin");
/// assert_eq!(config.unauthorized_route, "/unauthorized");
/// assert_eq!(config.sign_in_redirect("/dashboard/students"), "/signin?from=%2Fdashboard%2Fstudents");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GateConfig {
    /// Resource unauthenticated users are sent to
    pub sign_in_route: String,
    /// Resource forbidden users are sent to
    pub unauthorized_route: String,
    /// Query parameter that carries the originally requested resource
    pub return_to_param: String,
    /// Also read the profile store when the token carries a role claim, to
    /// detect claim/record mismatches
    pub corroborate_claims: bool,
    /// Landing resource per role
    pub landing: LandingRoutes,
    /// Protected route rules for [`RouteTable`](crate::RouteTable)
    pub routes: Vec<RouteRule>,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            sign_in_route: "/login".to_string(),
            unauthorized_route: "/unauthorized".to_string(),
            return_to_param: "from".to_string(),
            corroborate_claims: false,
            landing: LandingRoutes::default(),
            routes: school_portal_routes(),
        }
    }
}

/// The portal's protected areas.
pub fn school_portal_routes() -> Vec<RouteRule> {
    vec![
        RouteRule::new("/dashboard", ["admin", "super_admin"]),
        RouteRule::new("/teacher", ["teacher", "admin", "super_admin"]),
        RouteRule::new("/student", ["student", "admin", "super_admin"]),
    ]
}

impl GateConfig {
    /// Parses and validates a JSON configuration.
    pub fn from_json_str(json: &str) -> Result<Self, Error> {
        let config: GateConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a JSON configuration file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| Error::ConfigIo {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    /// Checks route shapes and role lists.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for malformed routes and
    /// [`Error::InvalidRoles`] for empty or unknown role lists.
    pub fn validate(&self) -> Result<(), Error> {
        check_route("sign_in_route", &self.sign_in_route)?;
        check_route("unauthorized_route", &self.unauthorized_route)?;
        for (name, route) in ["admin", "teacher", "student"]
            .into_iter()
            .zip(self.landing.all())
        {
            check_route(&format!("landing.{}", name), route)?;
        }

        if self.return_to_param.trim().is_empty() {
            return Err(Error::Config("return_to_param must not be empty".into()));
        }

        for rule in &self.routes {
            check_route("routes[].prefix", &rule.prefix)?;
            rule.allowed()?;
        }
        Ok(())
    }

    /// Builds the sign-in redirect that carries `resource` as return-to.
    pub fn sign_in_redirect(&self, resource: &str) -> String {
        format!(
            "{}?{}={}",
            self.sign_in_route,
            self.return_to_param,
            urlencoding::encode(resource)
        )
    }
}

fn check_route(field: &str, route: &str) -> Result<(), Error> {
    if !route.starts_with('/') {
        return Err(Error::Config(format!(
            "{} must be an absolute path, got `{}`",
            field, route
        )));
    }
    if route.contains('?') || route.contains('#') {
        return Err(Error::Config(format!(
            "{} must not carry a query or fragment, got `{}`",
            field, route
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::InvalidRoles;

    #[test]
    fn default_config_is_valid() {
        GateConfig::default().validate().unwrap();
    }

    #[test]
    fn empty_object_yields_defaults() {
        let config = GateConfig::from_json_str("{}").unwrap();
        assert_eq!(config, GateConfig::default());
    }

    #[test]
    fn sign_in_redirect_encodes_return_to() {
        let config = GateConfig::default();
        assert_eq!(
            config.sign_in_redirect("/teacher/subjects/Maths & Science/students"),
            "/login?from=%2Fteacher%2Fsubjects%2FMaths%20%26%20Science%2Fstudents"
        );
    }

    #[test]
    fn relative_route_is_rejected() {
        let err = GateConfig::from_json_str(r#"{ "unauthorized_route": "denied" }"#).unwrap_err();
        assert!(matches!(err, Error::Config(ref m) if m.contains("unauthorized_route")));
    }

    #[test]
    fn route_with_query_is_rejected() {
        let err = GateConfig::from_json_str(r#"{ "sign_in_route": "/login?x=1" }"#).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn empty_rule_roles_fail_loudly() {
        let err = GateConfig::from_json_str(
            r#"{ "routes": [ { "prefix": "/reports", "allowed_roles": [] } ] }"#,
        )
        .unwrap_err();
        assert!(matches!(err, Error::InvalidRoles(InvalidRoles::Empty)));
    }

    #[test]
    fn unknown_rule_role_fails_loudly() {
        let err = GateConfig::from_json_str(
            r#"{ "routes": [ { "prefix": "/reports", "allowed_roles": ["bursar"] } ] }"#,
        )
        .unwrap_err();
        assert!(matches!(err, Error::InvalidRoles(InvalidRoles::Unknown(_))));
    }

    #[test]
    fn unknown_field_is_a_parse_error() {
        let err = GateConfig::from_json_str(r#"{ "sign_in": "/login" }"#).unwrap_err();
        assert!(matches!(err, Error::ConfigParse(_)));
    }

    #[test]
    fn missing_file_reports_path() {
        let err = GateConfig::from_path("/nonexistent/portal-gate.json").unwrap_err();
        assert!(matches!(err, Error::ConfigIo { ref path, .. } if path.ends_with("portal-gate.json")));
    }

    #[test]
    fn empty_return_to_param_is_rejected() {
        let err = GateConfig::from_json_str(r#"{ "return_to_param": " " }"#).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
