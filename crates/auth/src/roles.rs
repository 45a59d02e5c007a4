use serde::{Deserialize, Serialize};

/// Role code as sent by the backend.
///
/// Known codes are closed variants so privilege checks can `match`
/// exhaustively. Parsing is case-sensitive: `"Admin"` is not `admin`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RoleCode {
    SuperAdmin,
    Admin,
    Manager,
    Editor,
    Viewer,
    /// A code this client has no special handling for.
    Other(String),
}

impl RoleCode {
    pub fn as_str(&self) -> &str {
        match self {
            RoleCode::SuperAdmin => "super-admin",
            RoleCode::Admin => "admin",
            RoleCode::Manager => "manager",
            RoleCode::Editor => "editor",
            RoleCode::Viewer => "viewer",
            RoleCode::Other(code) => code,
        }
    }

    /// Whether this code is on the privileged allow-list.
    pub fn is_privileged(&self) -> bool {
        match self {
            RoleCode::SuperAdmin | RoleCode::Admin => true,
            RoleCode::Manager | RoleCode::Editor | RoleCode::Viewer | RoleCode::Other(_) => false,
        }
    }
}

impl From<&str> for RoleCode {
    fn from(value: &str) -> Self {
        match value {
            "super-admin" => RoleCode::SuperAdmin,
            "admin" => RoleCode::Admin,
            "manager" => RoleCode::Manager,
            "editor" => RoleCode::Editor,
            "viewer" => RoleCode::Viewer,
            other => RoleCode::Other(other.to_string()),
        }
    }
}

impl From<String> for RoleCode {
    fn from(value: String) -> Self {
        RoleCode::from(value.as_str())
    }
}

impl From<RoleCode> for String {
    fn from(value: RoleCode) -> Self {
        value.as_str().to_string()
    }
}

impl core::fmt::Display for RoleCode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Role assigned to an identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Role {
    pub code: RoleCode,
    pub label: String,
}

impl Role {
    pub fn new(code: impl Into<RoleCode>, label: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            label: label.into(),
        }
    }
}
