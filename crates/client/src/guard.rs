//! Route guard: decides whether a navigation may proceed for the current identity.

use tracing::debug;

use adminshell_auth::{Identity, is_admin};
use adminshell_i18n::{Locale, LocaleTable, ensure_localized_pathname};

pub const LOGIN_ROUTE: &str = "/login";
pub const HOME_ROUTE: &str = "/dashboard";
pub const PUBLIC_ROUTES: &[&str] = &[LOGIN_ROUTE, "/register", "/forgot-password"];
pub const PRIVILEGED_PREFIXES: &[&str] = &["/admin", "/users", "/roles"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectReason {
    /// Nobody is logged in.
    Unauthenticated,
    /// The identity lacks a privileged role.
    Forbidden,
    /// A logged-in user opened the login page.
    AlreadyAuthenticated,
    /// The path was not in its localized form (e.g. an explicit default prefix).
    Canonicalize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum GuardDecision {
    Allow {
        locale: &'static Locale,
        /// The route without its locale prefix.
        route: String,
    },
    Redirect {
        to: String,
        reason: RedirectReason,
    },
}

impl GuardDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, GuardDecision::Allow { .. })
    }

    pub fn redirect_target(&self) -> Option<&str> {
        match self {
            GuardDecision::Redirect { to, .. } => Some(to),
            GuardDecision::Allow { .. } => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RouteGuard {
    table: LocaleTable,
    public_routes: Vec<String>,
    privileged_prefixes: Vec<String>,
}

impl RouteGuard {
    pub fn new(table: LocaleTable) -> Self {
        Self {
            table,
            public_routes: PUBLIC_ROUTES.iter().map(|r| r.to_string()).collect(),
            privileged_prefixes: PRIVILEGED_PREFIXES.iter().map(|r| r.to_string()).collect(),
        }
    }

    pub fn with_public_route(mut self, route: impl Into<String>) -> Self {
        self.public_routes.push(route.into());
        self
    }

    pub fn with_privileged_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.privileged_prefixes.push(prefix.into());
        self
    }

    pub fn table(&self) -> &LocaleTable {
        &self.table
    }

    /// Decide on a navigation to `path` (possibly locale-prefixed).
    ///
    /// Redirect targets are localized for the locale found in `path`.
    pub fn check(&self, path: &str, identity: Option<&Identity>) -> GuardDecision {
        let pathname = path.split(['?', '#']).next().unwrap_or(path);
        let (path_locale, route) = self.table.split_locale(pathname);
        let locale = path_locale.unwrap_or(self.table.default_locale());

        let canonical = ensure_localized_pathname(&self.table, path, locale);
        if canonical != path {
            return self.redirect(path, canonical, RedirectReason::Canonicalize);
        }

        if self.is_public(route) {
            if route == LOGIN_ROUTE && identity.is_some() {
                let to = ensure_localized_pathname(&self.table, HOME_ROUTE, locale);
                return self.redirect(path, to, RedirectReason::AlreadyAuthenticated);
            }
            return allow(locale, route);
        }

        let Some(identity) = identity else {
            let to = ensure_localized_pathname(&self.table, LOGIN_ROUTE, locale);
            return self.redirect(path, to, RedirectReason::Unauthenticated);
        };

        if self.is_privileged(route) && !is_admin(Some(identity)) {
            let to = ensure_localized_pathname(&self.table, HOME_ROUTE, locale);
            return self.redirect(path, to, RedirectReason::Forbidden);
        }

        allow(locale, route)
    }

    fn is_public(&self, route: &str) -> bool {
        self.public_routes.iter().any(|r| matches_prefix(route, r))
    }

    fn is_privileged(&self, route: &str) -> bool {
        self.privileged_prefixes.iter().any(|p| matches_prefix(route, p))
    }

    fn redirect(&self, from: &str, to: String, reason: RedirectReason) -> GuardDecision {
        debug!(from, to = %to, ?reason, "route guard redirect");
        GuardDecision::Redirect { to, reason }
    }
}

fn allow(locale: &'static Locale, route: &str) -> GuardDecision {
    GuardDecision::Allow {
        locale,
        route: route.to_string(),
    }
}

/// `/users` matches `/users` and `/users/42`, not `/usersettings`.
fn matches_prefix(route: &str, prefix: &str) -> bool {
    match route.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}
