//! `adminshell-i18n` — locales, dictionaries and locale-prefixed paths.
//!
//! - [`LocaleTable`]: the supported locales, their text direction and the
//!   configured default.
//! - [`load_dictionary`]: bundled key→string catalogs, one per locale.
//! - [`ensure_localized_pathname`]: rewrites a route path so it carries the
//!   right locale prefix (none for the default locale).
//!
//! Consumers never hardcode locale codes; they go through the table.

pub mod dictionary;
pub mod locale;
pub mod path;
pub mod resolve;

pub use dictionary::{Dictionary, ParityIssue, check_catalog_parity, load_dictionary};
pub use locale::{DEFAULT_LOCALE, Direction, LOCALES, Locale, LocaleTable};
pub use path::ensure_localized_pathname;
pub use resolve::resolve_locale_with_preference;
