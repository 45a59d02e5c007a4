//! Authenticated identity as seen by the client.
//!
//! An [`Identity`] is an immutable value: updates build a new one
//! ([`Identity::patched`]) which then replaces the stored snapshot wholesale.

use serde::{Deserialize, Deserializer, Serialize};

use adminshell_core::UserId;
use adminshell_i18n::Direction;

use crate::{Role, RoleCode};

// ─────────────────────────────────────────────────────────────────────────────
// Status
// ─────────────────────────────────────────────────────────────────────────────

/// Presence status shown next to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    Online,
    #[default]
    Offline,
    Away,
    Busy,
    Invisible,
}

impl UserStatus {
    /// Dictionary key of the status label.
    pub fn label_key(&self) -> &'static str {
        match self {
            UserStatus::Online => "status.online",
            UserStatus::Offline => "status.offline",
            UserStatus::Away => "status.away",
            UserStatus::Busy => "status.busy",
            UserStatus::Invisible => "status.invisible",
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Preferences
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorMode {
    Light,
    Dark,
    #[default]
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Layout {
    #[default]
    Vertical,
    Horizontal,
}

/// Per-user display preferences.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
    pub theme: String,
    pub mode: ColorMode,
    /// Corner radius in rem.
    pub radius: f32,
    pub layout: Layout,
    pub direction: Direction,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            theme: "default".to_string(),
            mode: ColorMode::default(),
            radius: 0.5,
            layout: Layout::default(),
            direction: Direction::default(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Identity
// ─────────────────────────────────────────────────────────────────────────────

/// The logged-in user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub id: UserId,
    pub email: String,
    pub username: String,
    pub display_name: String,
    #[serde(default)]
    pub status: UserStatus,
    /// Ordered, without duplicate codes. A repeated code in a payload keeps
    /// its first occurrence.
    #[serde(default, deserialize_with = "unique_roles")]
    pub roles: Vec<Role>,
    #[serde(default)]
    pub preferences: Preferences,
}

impl Identity {
    pub fn new(
        id: UserId,
        email: impl Into<String>,
        username: impl Into<String>,
        display_name: impl Into<String>,
    ) -> Self {
        Self {
            id,
            email: email.into(),
            username: username.into(),
            display_name: display_name.into(),
            status: UserStatus::default(),
            roles: Vec::new(),
            preferences: Preferences::default(),
        }
    }

    /// Builder-style role assignment; duplicate codes are ignored.
    pub fn with_role(mut self, role: Role) -> Self {
        if !self.has_role(&role.code) {
            self.roles.push(role);
        }
        self
    }

    pub fn has_role(&self, code: &RoleCode) -> bool {
        self.roles.iter().any(|r| &r.code == code)
    }

    /// Build the identity that results from applying `patch`.
    ///
    /// Roles are not part of a patch: a user cannot change their own
    /// privileges from the client.
    pub fn patched(&self, patch: &IdentityPatch) -> Identity {
        let mut next = self.clone();
        if let Some(email) = &patch.email {
            next.email = email.clone();
        }
        if let Some(username) = &patch.username {
            next.username = username.clone();
        }
        if let Some(display_name) = &patch.display_name {
            next.display_name = display_name.clone();
        }
        if let Some(status) = patch.status {
            next.status = status;
        }
        if let Some(preferences) = &patch.preferences {
            next.preferences = preferences.clone();
        }
        next
    }
}

fn unique_roles<'de, D>(deserializer: D) -> Result<Vec<Role>, D::Error>
where
    D: Deserializer<'de>,
{
    let roles = Vec::<Role>::deserialize(deserializer)?;
    let mut unique: Vec<Role> = Vec::with_capacity(roles.len());
    for role in roles {
        if !unique.iter().any(|r| r.code == role.code) {
            unique.push(role);
        }
    }
    Ok(unique)
}

/// Partial profile/preference update.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<UserStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preferences: Option<Preferences>,
}

impl IdentityPatch {
    pub fn is_empty(&self) -> bool {
        self == &IdentityPatch::default()
    }
}
