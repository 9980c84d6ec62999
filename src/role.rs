//! Roles, durable role assignments, and validated allowed-role sets.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{InvalidRoles, ParseRoleError};

/// The role a principal holds. Exactly one per principal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Enrolled student
    Student,
    /// Teaching staff
    Teacher,
    /// School administrator
    Admin,
    /// Administrator allowed to manage other administrators
    SuperAdmin,
}

impl Role {
    /// Every role, in ascending privilege order.
    pub const ALL: [Role; 4] = [Role::Student, Role::Teacher, Role::Admin, Role::SuperAdmin];

    /// Wire name of the role, as carried in the `role` claim.
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Teacher => "teacher",
            Role::Admin => "admin",
            Role::SuperAdmin => "super_admin",
        }
    }

    /// Returns `true` only for [`Role::SuperAdmin`].
    pub fn is_super_admin(self) -> bool {
        self == Role::SuperAdmin
    }

    fn bit(self) -> u8 {
        1 << (self as u8)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ParseRoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "student" => Ok(Role::Student),
            "teacher" => Ok(Role::Teacher),
            "admin" => Ok(Role::Admin),
            "super_admin" => Ok(Role::SuperAdmin),
            other => Err(ParseRoleError(other.to_string())),
        }
    }
}

/// Durable, administrator-controlled record of a principal's role.
///
/// The gate only reads these. They corroborate the token claim and are never
/// used to grant access on their own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleAssignment {
    /// Identifier of the principal this record belongs to
    pub principal_id: String,
    /// The assigned role
    pub role: Role,
}

impl RoleAssignment {
    /// Creates a role assignment record.
    pub fn new(principal_id: impl Into<String>, role: Role) -> Self {
        Self {
            principal_id: principal_id.into(),
            role,
        }
    }

    /// Derived flag, true iff the role is `super_admin`.
    pub fn is_super_admin(&self) -> bool {
        self.role.is_super_admin()
    }
}

/// A non-empty set of roles permitted to enter a resource.
///
/// Construction is the only place a bad set can be detected, so an
/// `AllowedRoles` value is always valid by the time it reaches
/// [`AuthorizationGate::authorize`](crate::AuthorizationGate::authorize).
///
/// # Examples
///
/// ```
/// use portal_gate::{AllowedRoles, Role};
///
/// let admins = AllowedRoles::new([Role::Admin, Role::SuperAdmin]).unwrap();
/// assert!(admins.contains(Role::SuperAdmin));
/// assert!(!admins.contains(Role::Student));
///
/// let parsed: AllowedRoles = "teacher, admin".parse().unwrap();
/// assert_eq!(parsed.len(), 2);
///
/// assert!(AllowedRoles::new([]).is_err());
/// assert!("teacher, janitor".parse::<AllowedRoles>().is_err());
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct AllowedRoles {
    mask: u8,
}

impl AllowedRoles {
    /// Builds a set from roles, rejecting an empty input.
    pub fn new(roles: impl IntoIterator<Item = Role>) -> Result<Self, InvalidRoles> {
        let mask = roles.into_iter().fold(0u8, |mask, role| mask | role.bit());
        if mask == 0 {
            return Err(InvalidRoles::Empty);
        }
        Ok(Self { mask })
    }

    /// Builds a set from role names, rejecting unknown names and empty input.
    pub fn parse<'a>(names: impl IntoIterator<Item = &'a str>) -> Result<Self, InvalidRoles> {
        let roles = names
            .into_iter()
            .map(|name| name.trim().parse::<Role>())
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(roles)
    }

    /// Returns `true` if `role` is permitted.
    pub fn contains(&self, role: Role) -> bool {
        self.mask & role.bit() != 0
    }

    /// Iterates the permitted roles in ascending privilege order.
    pub fn iter(&self) -> impl Iterator<Item = Role> + '_ {
        Role::ALL.into_iter().filter(|role| self.contains(*role))
    }

    /// Number of permitted roles.
    pub fn len(&self) -> usize {
        self.mask.count_ones() as usize
    }

    /// Always `false`; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.mask == 0
    }
}

impl fmt::Debug for AllowedRoles {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl fmt::Display for AllowedRoles {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.iter().map(Role::as_str).collect();
        f.write_str(&names.join(","))
    }
}

impl FromStr for AllowedRoles {
    type Err = InvalidRoles;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s.split(',').filter(|part| !part.trim().is_empty()))
    }
}
