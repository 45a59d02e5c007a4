//! Effective locale resolution.

use crate::locale::{Locale, LocaleTable};

/// Resolve the effective locale for a request.
///
/// Resolution order (highest to lowest priority):
/// 1. The user's stored preference (if supported)
/// 2. The locale segment of the URL (if supported)
/// 3. The table's default locale
pub fn resolve_locale_with_preference(
    table: &LocaleTable,
    user_locale: Option<&str>,
    path_locale: Option<&str>,
) -> &'static Locale {
    user_locale
        .and_then(|code| table.find(code))
        .or_else(|| path_locale.and_then(|code| table.find(code)))
        .unwrap_or(table.default_locale())
}
