//! Role to landing-resource mapping.
//!
//! This is the one table consulted after a successful sign-in to decide where
//! a principal lands. Administrators and super administrators share the
//! administrative dashboard.

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::principal::RoleClaim;
use crate::role::Role;

/// Landing resources per role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LandingRoutes {
    /// Administrative dashboard root (`admin` and `super_admin`)
    pub admin: String,
    /// Teacher dashboard root
    pub teacher: String,
    /// Student portal root
    pub student: String,
}

impl Default for LandingRoutes {
    fn default() -> Self {
        Self {
            admin: "/dashboard".to_string(),
            teacher: "/teacher".to_string(),
            student: "/student".to_string(),
        }
    }
}

impl LandingRoutes {
    /// Landing resource for a known role.
    pub fn for_role(&self, role: Role) -> &str {
        match role {
            Role::Admin | Role::SuperAdmin => &self.admin,
            Role::Teacher => &self.teacher,
            Role::Student => &self.student,
        }
    }

    /// Landing resource for a raw role value.
    ///
    /// # Errors
    ///
    /// Absent or unknown roles have no landing resource and yield
    /// [`Error::UnmappedRole`]; callers must not fall back to a dashboard.
    pub fn for_raw(&self, raw: Option<&str>) -> Result<&str, Error> {
        match raw.map(str::parse::<Role>) {
            Some(Ok(role)) => Ok(self.for_role(role)),
            _ => Err(Error::UnmappedRole(raw.map(str::to_string))),
        }
    }

    /// Landing resource for an interpreted role claim.
    pub fn for_claim(&self, claim: &RoleClaim) -> Result<&str, Error> {
        match claim {
            RoleClaim::Valid(role) => Ok(self.for_role(*role)),
            RoleClaim::Missing => Err(Error::UnmappedRole(None)),
            RoleClaim::Malformed(raw) => Err(Error::UnmappedRole(Some(raw.clone()))),
        }
    }

    pub(crate) fn all(&self) -> [&str; 3] {
        [&self.admin, &self.teacher, &self.student]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admins_share_dashboard() {
        let landing = LandingRoutes::default();
        assert_eq!(landing.for_role(Role::Admin), "/dashboard");
        assert_eq!(landing.for_role(Role::SuperAdmin), "/dashboard");
        assert_eq!(landing.for_role(Role::Teacher), "/teacher");
        assert_eq!(landing.for_role(Role::Student), "/student");
    }

    #[test]
    fn raw_unknown_or_absent_role_is_an_error() {
        let landing = LandingRoutes::default();
        assert_eq!(landing.for_raw(Some("super_admin")).unwrap(), "/dashboard");
        assert!(matches!(
            landing.for_raw(Some("parent")),
            Err(Error::UnmappedRole(Some(ref r))) if r == "parent"
        ));
        assert!(matches!(landing.for_raw(None), Err(Error::UnmappedRole(None))));
    }

    #[test]
    fn claim_mapping_follows_role_mapping() {
        let landing = LandingRoutes::default();
        assert_eq!(
            landing.for_claim(&RoleClaim::Valid(Role::Student)).unwrap(),
            "/student"
        );
        assert!(landing.for_claim(&RoleClaim::Missing).is_err());
        assert!(landing
            .for_claim(&RoleClaim::Malformed("7".to_string()))
            .is_err());
    }
}
