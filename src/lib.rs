//! Role-resolution and route-authorization gate for the school portal.
//!
//! The portal's views are gated by role: administrators, teachers and
//! students each have their own area. This crate decides, per navigation,
//! whether the signed-in principal may enter a view and where to send them if
//! not.
//!
//! - **Trusted claims**: the role comes from the verified session token's
//!   `role` claim, after a forced token refresh on every sign-in
//! - **Diagnostic records**: the durable role record is read only to detect
//!   stale tokens and provisioning defects; it never grants access
//! - **Stale-write safety**: resolutions are tagged with a session epoch and
//!   dropped if a newer event (such as a sign-out) arrived meanwhile
//!
//! # Core Types
//!
//! - [`AuthorizationGate`]: Session state, role resolution and decisions
//! - [`AllowedRoles`]: Validated, non-empty set of permitted roles
//! - [`AuthorizationDecision`]: `granted`, `pending`, or a denial with redirect
//! - [`IdentityProvider`] / [`ProfileStore`]: External collaborators
//! - [`RouteTable`]: Router-side mapping from paths to allowed roles
//! - [`LandingRoutes`]: Where each role lands after signing in
//!
//! # Examples
//!
//! ```
//! use portal_gate::{AllowedRoles, GateConfig, LandingRoutes, Role, RouteTable};
//!
//! let routes = RouteTable::from_config(&GateConfig::default()).unwrap();
//! let teacher_area = routes.lookup("/teacher/attendance").unwrap();
//! assert!(teacher_area.contains(Role::Teacher));
//! assert!(!teacher_area.contains(Role::Student));
//!
//! let landing = LandingRoutes::default();
//! assert_eq!(landing.for_role(Role::SuperAdmin), "/dashboard");
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod audit;
mod config;
mod decision;
mod error;
mod gate;
mod landing;
mod logging;
mod principal;
mod provider;
mod role;
mod routes;
mod state;
mod token;

pub use config::{school_portal_routes, GateConfig, RouteRule};
pub use decision::{AccessGrant, AuthorizationDecision, Outcome};
pub use error::{Error, InvalidRoles, ParseRoleError, ProviderError};
pub use gate::{AuthorizationGate, GateBuilder, SessionListener, SubscriptionId};
pub use landing::LandingRoutes;
pub use principal::{Claims, Principal, RoleClaim, SessionEvent, ROLE_CLAIM};
pub use provider::{IdentityProvider, ProfileStore};
pub use role::{AllowedRoles, Role, RoleAssignment};
pub use routes::RouteTable;
pub use state::SessionSnapshot;
pub use token::SessionToken;
