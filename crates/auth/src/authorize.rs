use serde::Serialize;

use crate::Identity;

/// Whether the identity holds a privileged role (`super-admin` or `admin`).
///
/// - No IO
/// - No panics
/// - `None` (unauthenticated) is simply `false`
pub fn is_admin(identity: Option<&Identity>) -> bool {
    identity.is_some_and(|i| i.roles.iter().any(|r| r.code.is_privileged()))
}

/// Coarse capability flags derived from the current snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Capabilities {
    pub authenticated: bool,
    pub is_admin: bool,
}

impl Capabilities {
    pub fn from_identity(identity: Option<&Identity>) -> Self {
        Self {
            authenticated: identity.is_some(),
            is_admin: is_admin(identity),
        }
    }
}

/// A navigation entry.
///
/// `href` is the unlocalized route; localization happens when the menu is
/// built for a locale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavLink {
    /// Dictionary key of the label.
    pub label_key: String,
    pub href: String,
    /// Retained only for administrators.
    pub privileged: bool,
}

impl NavLink {
    pub fn new(label_key: impl Into<String>, href: impl Into<String>) -> Self {
        Self {
            label_key: label_key.into(),
            href: href.into(),
            privileged: false,
        }
    }

    pub fn privileged(label_key: impl Into<String>, href: impl Into<String>) -> Self {
        Self {
            privileged: true,
            ..Self::new(label_key, href)
        }
    }
}

/// Drop privileged links unless the identity is an administrator.
///
/// Order of the remaining links is preserved.
pub fn filter_links(links: &[NavLink], identity: Option<&Identity>) -> Vec<NavLink> {
    let admin = is_admin(identity);
    links
        .iter()
        .filter(|link| !link.privileged || admin)
        .cloned()
        .collect()
}

// ─────────────────────────────────────────────────────────────────────────────
// Authorization Explanation (Audit Trail)
// ─────────────────────────────────────────────────────────────────────────────

/// Why privileged access was granted or denied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccessExplanation {
    pub granted: bool,
    pub reason: String,
    /// Role codes the identity holds, in assignment order.
    pub roles: Vec<String>,
    /// Role codes that granted access.
    pub granting_roles: Vec<String>,
}

/// Explain the outcome of [`is_admin`] for diagnostics and audit logs.
pub fn explain_privileged_access(identity: Option<&Identity>) -> AccessExplanation {
    let Some(identity) = identity else {
        return AccessExplanation {
            granted: false,
            reason: "No authenticated identity".to_string(),
            roles: Vec::new(),
            granting_roles: Vec::new(),
        };
    };

    let roles: Vec<String> = identity.roles.iter().map(|r| r.code.to_string()).collect();
    let granting_roles: Vec<String> = identity
        .roles
        .iter()
        .filter(|r| r.code.is_privileged())
        .map(|r| r.code.to_string())
        .collect();

    let granted = !granting_roles.is_empty();
    let reason = if granted {
        format!("Granted by role(s) {:?}", granting_roles)
    } else {
        format!(
            "None of the roles {:?} is on the privileged allow-list (super-admin, admin)",
            roles
        )
    };

    AccessExplanation {
        granted,
        reason,
        roles,
        granting_roles,
    }
}
