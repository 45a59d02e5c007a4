//! Locale Table: supported locales, text direction, default locale.

use serde::{Deserialize, Serialize};
use tracing::debug;

use adminshell_core::{ShellError, ShellResult};

/// Text direction of a locale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Direction {
    #[default]
    #[serde(rename = "ltr")]
    LeftToRight,
    #[serde(rename = "rtl")]
    RightToLeft,
}

impl Direction {
    /// Value for the document `dir` attribute.
    pub fn html_dir(&self) -> &'static str {
        match self {
            Direction::LeftToRight => "ltr",
            Direction::RightToLeft => "rtl",
        }
    }

    pub fn is_rtl(&self) -> bool {
        matches!(self, Direction::RightToLeft)
    }
}

/// A supported locale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Locale {
    pub code: &'static str,
    pub direction: Direction,
    pub display_name: &'static str,
}

/// Every locale the shell ships content for.
pub const LOCALES: &[Locale] = &[
    Locale {
        code: "en",
        direction: Direction::LeftToRight,
        display_name: "English",
    },
    Locale {
        code: "fr",
        direction: Direction::LeftToRight,
        display_name: "Français",
    },
    Locale {
        code: "ar",
        direction: Direction::RightToLeft,
        display_name: "العربية",
    },
];

/// Built-in default locale code.
pub const DEFAULT_LOCALE: &str = "en";

/// Immutable view over [`LOCALES`] with a configured default.
///
/// Built once at startup and passed around by reference; it has no interior
/// state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocaleTable {
    locales: &'static [Locale],
    default: &'static Locale,
}

impl Default for LocaleTable {
    fn default() -> Self {
        Self::builtin()
    }
}

impl LocaleTable {
    /// The shipped locales with [`DEFAULT_LOCALE`] as default.
    pub fn builtin() -> Self {
        let default = LOCALES
            .iter()
            .find(|l| l.code == DEFAULT_LOCALE)
            .unwrap_or(&LOCALES[0]);
        Self {
            locales: LOCALES,
            default,
        }
    }

    /// The shipped locales with a different default.
    pub fn with_default(code: &str) -> ShellResult<Self> {
        let table = Self::builtin();
        let default = table.get(code)?;
        Ok(Self { default, ..table })
    }

    pub fn locales(&self) -> &'static [Locale] {
        self.locales
    }

    pub fn default_locale(&self) -> &'static Locale {
        self.default
    }

    pub fn is_default(&self, locale: &Locale) -> bool {
        locale.code == self.default.code
    }

    pub fn is_supported(&self, code: &str) -> bool {
        self.find(code).is_some()
    }

    /// Exact, case-sensitive lookup.
    pub fn find(&self, code: &str) -> Option<&'static Locale> {
        self.locales.iter().find(|l| l.code == code)
    }

    /// Strict lookup; the error is meant to be recovered where resolution
    /// happens, see [`LocaleTable::resolve`].
    pub fn get(&self, code: &str) -> ShellResult<&'static Locale> {
        self.find(code)
            .ok_or_else(|| ShellError::locale_not_found(code))
    }

    /// Resolve a locale code, falling back to the default. Never fails.
    pub fn resolve(&self, code: &str) -> &'static Locale {
        match self.get(code) {
            Ok(locale) => locale,
            Err(err) => {
                debug!(%err, fallback = self.default.code, "falling back to default locale");
                self.default
            }
        }
    }

    /// Split a leading locale segment off `path`.
    ///
    /// Only a whole first segment matching a code counts: `/fr/users` yields
    /// `(Some(fr), "/users")`, while `/french` and `/frx/a` are left intact.
    /// The remainder always starts with `/`.
    pub fn split_locale<'p>(&self, path: &'p str) -> (Option<&'static Locale>, &'p str) {
        let trimmed = path.strip_prefix('/').unwrap_or(path);
        let (segment, rest) = match trimmed.find('/') {
            Some(idx) => (&trimmed[..idx], &trimmed[idx..]),
            None => (trimmed, ""),
        };

        match self.find(segment) {
            Some(locale) if rest.is_empty() => (Some(locale), "/"),
            Some(locale) => (Some(locale), rest),
            None => (None, path),
        }
    }

    /// Pick the best supported locale for an `Accept-Language` header.
    ///
    /// Entries are ranked by q-value (ties keep header order); region tags are
    /// reduced to their primary language; `q=0` entries are ignored.
    pub fn negotiate(&self, accept_language: &str) -> &'static Locale {
        let mut ranked: Vec<(&str, f32)> = accept_language
            .split(',')
            .filter_map(|entry| {
                let mut parts = entry.split(';');
                let tag = parts.next()?.trim();
                if tag.is_empty() {
                    return None;
                }
                let q = parts
                    .find_map(|p| p.trim().strip_prefix("q="))
                    .map(|q| q.trim().parse::<f32>().unwrap_or(0.0))
                    .unwrap_or(1.0);
                Some((tag, q))
            })
            .filter(|(_, q)| *q > 0.0)
            .collect();

        // Stable sort keeps header order for equal weights.
        ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(core::cmp::Ordering::Equal));

        ranked
            .into_iter()
            .find_map(|(tag, _)| {
                let primary = tag.split(['-', '_']).next().unwrap_or(tag).to_ascii_lowercase();
                self.find(&primary)
            })
            .unwrap_or(self.default)
    }
}
