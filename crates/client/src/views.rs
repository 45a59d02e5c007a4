//! View models for the header and the security screen.
//!
//! Both are total: every identity/fetch state maps to something renderable.

use serde::Serialize;

use adminshell_auth::{Identity, is_admin};
use adminshell_core::SessionId;
use adminshell_i18n::{Dictionary, Locale};

use crate::sessions::FetchState;
use crate::types::Session;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M UTC";

/// Dictionary keys the views render.
pub const VIEW_KEYS: &[&str] = &[
    "auth.welcome",
    "auth.login",
    "common.loading",
    "security.title",
    "security.no_recent_activity",
    "security.unknown",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HeaderView {
    pub greeting: String,
    pub status: String,
    pub is_admin: bool,
    /// Document `dir` attribute.
    pub dir: &'static str,
}

impl HeaderView {
    /// Logged-out users get a sign-in prompt instead of a greeting.
    pub fn render(identity: Option<&Identity>, locale: &Locale, dictionary: &Dictionary) -> Self {
        let dir = locale.direction.html_dir();
        match identity {
            Some(identity) => Self {
                greeting: dictionary.format("auth.welcome", &[("name", identity.display_name.as_str())]),
                status: dictionary.text(identity.status.label_key()).to_string(),
                is_admin: is_admin(Some(identity)),
                dir,
            },
            None => Self {
                greeting: dictionary.text("auth.login").to_string(),
                status: String::new(),
                is_admin: false,
                dir,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionRow {
    pub id: SessionId,
    pub device: String,
    pub ip: String,
    pub signed_in: String,
    pub expires: String,
}

impl SessionRow {
    fn from_session(session: &Session, unknown: &str) -> Self {
        Self {
            id: session.id,
            device: session.user_agent.clone().unwrap_or_else(|| unknown.to_string()),
            ip: session.ip.clone().unwrap_or_else(|| unknown.to_string()),
            signed_in: session.created_at.format(TIMESTAMP_FORMAT).to_string(),
            expires: session.expires_at.format(TIMESTAMP_FORMAT).to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SecurityView {
    /// No identity; the screen falls back to the logged-out rendering path.
    Hidden,
    Loading { label: String },
    Empty { message: String },
    Rows { title: String, rows: Vec<SessionRow> },
}

impl SecurityView {
    /// A failed fetch renders like an empty one.
    pub fn render(identity: Option<&Identity>, state: &FetchState, dictionary: &Dictionary) -> Self {
        if identity.is_none() {
            return SecurityView::Hidden;
        }
        if state.is_loading() {
            return SecurityView::Loading {
                label: dictionary.text("common.loading").to_string(),
            };
        }

        let sessions = state.sessions();
        if sessions.is_empty() {
            return SecurityView::Empty {
                message: dictionary.text("security.no_recent_activity").to_string(),
            };
        }

        let unknown = dictionary.text("security.unknown");
        SecurityView::Rows {
            title: dictionary.text("security.title").to_string(),
            rows: sessions.iter().map(|s| SessionRow::from_session(s, unknown)).collect(),
        }
    }
}
