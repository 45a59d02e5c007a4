//! `adminshell-auth` — identity model and role-based authorization.
//!
//! Pure data and pure functions: no IO, no shared state. The live identity is
//! held by `adminshell-store`; everything here is computed from a snapshot.

pub mod authorize;
pub mod identity;
pub mod roles;

pub use authorize::{
    AccessExplanation, Capabilities, NavLink, explain_privileged_access, filter_links, is_admin,
};
pub use identity::{ColorMode, Identity, IdentityPatch, Layout, Preferences, UserStatus};
pub use roles::{Role, RoleCode};
