//! Navigation model: the localized, role-filtered sidebar menu.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use tracing::{debug, warn};

use adminshell_auth::{Identity, NavLink, filter_links};
use adminshell_i18n::{Locale, LocaleTable, ensure_localized_pathname, load_dictionary};
use adminshell_store::{IdentityChange, IdentityStore, Subscription};

/// A menu entry ready to render.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavItem {
    pub label: String,
    pub href: String,
}

/// The shell's menu, in display order.
pub fn default_links() -> Vec<NavLink> {
    vec![
        NavLink::new("nav.dashboard", "/dashboard"),
        NavLink::privileged("nav.users", "/users"),
        NavLink::privileged("nav.roles", "/roles"),
        NavLink::new("nav.profile", "/profile"),
        NavLink::new("nav.security", "/profile/security"),
        NavLink::new("nav.settings", "/settings"),
    ]
}

/// Filter `links` for `identity`, then translate and localize them.
pub fn build_menu(
    table: &LocaleTable,
    locale: &Locale,
    links: &[NavLink],
    identity: Option<&Identity>,
) -> Vec<NavItem> {
    let dictionary = match load_dictionary(locale.code) {
        Ok(dictionary) => Some(dictionary),
        Err(err) => {
            warn!(locale = locale.code, error = %err, "menu labels fall back to keys");
            None
        }
    };

    filter_links(links, identity)
        .into_iter()
        .map(|link| NavItem {
            label: dictionary
                .map(|d| d.text(&link.label_key).to_string())
                .unwrap_or_else(|| link.label_key.clone()),
            href: ensure_localized_pathname(table, &link.href, locale),
        })
        .collect()
}

struct Menu {
    revision: Option<u64>,
    items: Vec<NavItem>,
}

struct MenuSource {
    table: LocaleTable,
    locale: &'static Locale,
    links: Vec<NavLink>,
    menu: Mutex<Menu>,
}

impl MenuSource {
    fn lock(&self) -> MutexGuard<'_, Menu> {
        self.menu.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Recompute unless `change` is older than what is already shown.
    fn apply(&self, change: &IdentityChange) {
        let items = build_menu(&self.table, self.locale, &self.links, change.identity());
        let mut menu = self.lock();
        if menu.revision.is_some_and(|shown| shown > change.revision) {
            return;
        }
        debug!(revision = change.revision, items = items.len(), "navigation recomputed");
        menu.revision = Some(change.revision);
        menu.items = items;
    }
}

/// Menu that follows the identity store.
///
/// The model holds no handle to the store, only its subscription; dropping
/// the model unsubscribes.
pub struct NavigationModel {
    source: Arc<MenuSource>,
    _subscription: Subscription,
}

impl NavigationModel {
    pub fn new(store: &IdentityStore, table: LocaleTable, locale: &'static Locale) -> Self {
        Self::with_links(store, table, locale, default_links())
    }

    pub fn with_links(
        store: &IdentityStore,
        table: LocaleTable,
        locale: &'static Locale,
        links: Vec<NavLink>,
    ) -> Self {
        let source = Arc::new(MenuSource {
            table,
            locale,
            links,
            menu: Mutex::new(Menu {
                revision: None,
                items: Vec::new(),
            }),
        });

        // Subscribe before reading the snapshot so no change falls in between.
        let subscription = store.subscribe({
            let source = Arc::clone(&source);
            move |change| source.apply(change)
        });
        source.apply(&store.current());

        Self {
            source,
            _subscription: subscription,
        }
    }

    pub fn items(&self) -> Vec<NavItem> {
        self.source.lock().items.clone()
    }

    pub fn locale(&self) -> &'static Locale {
        self.source.locale
    }

    /// Value for the document `dir` attribute.
    pub fn dir(&self) -> &'static str {
        self.source.locale.direction.html_dir()
    }
}

impl core::fmt::Debug for NavigationModel {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let menu = self.source.lock();
        f.debug_struct("NavigationModel")
            .field("locale", &self.source.locale.code)
            .field("revision", &menu.revision)
            .field("items", &menu.items.len())
            .finish()
    }
}
