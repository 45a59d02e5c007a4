//! Path Localizer.

use crate::locale::{Locale, LocaleTable};

/// Rewrite `path` so it carries `locale`'s prefix.
///
/// Any recognized locale segments at the front of the path are stripped first,
/// then the target prefix is prepended, unless `locale` is the table's default
/// (clean URLs). Query strings and fragments are carried over untouched.
///
/// Re-applying with the same locale returns the same string.
pub fn ensure_localized_pathname(table: &LocaleTable, path: &str, locale: &Locale) -> String {
    let (pathname, suffix) = split_suffix(path);

    let mut rest = if pathname.starts_with('/') {
        pathname.to_string()
    } else {
        format!("/{pathname}")
    };

    // `/fr/ar/x` loses both prefixes, otherwise the second would surface on
    // the next application.
    while let (Some(_), stripped) = table.split_locale(&rest) {
        rest = stripped.to_string();
    }

    let mut localized = if table.is_default(locale) {
        rest
    } else if rest == "/" {
        format!("/{}", locale.code)
    } else {
        format!("/{}{}", locale.code, rest)
    };

    localized.push_str(suffix);
    localized
}

fn split_suffix(path: &str) -> (&str, &str) {
    match path.find(['?', '#']) {
        Some(idx) => path.split_at(idx),
        None => (path, ""),
    }
}
