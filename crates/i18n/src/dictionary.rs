//! Dictionary Loader: bundled key→string catalogs, one per locale.
//!
//! Catalogs are compiled into the binary (`catalogs/*.json`) and parsed once on
//! first use. Every catalog must define the same key set; that is checked by
//! [`check_catalog_parity`] and enforced by the tests below, not at runtime.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::OnceLock;

use serde::Deserialize;
use tracing::warn;

use adminshell_core::{ShellError, ShellResult};

use crate::locale::LOCALES;

/// Key→string mapping for one locale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dictionary {
    locale: &'static str,
    version: u32,
    entries: BTreeMap<String, String>,
}

#[derive(Deserialize)]
struct CatalogFile {
    version: u32,
    entries: BTreeMap<String, String>,
}

impl Dictionary {
    pub fn locale(&self) -> &'static str {
        self.locale
    }

    /// Content version of the bundled catalog.
    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Strict lookup. A missing key is a content-integrity defect.
    pub fn translate(&self, key: &str) -> ShellResult<&str> {
        self.entries
            .get(key)
            .map(String::as_str)
            .ok_or_else(|| ShellError::key_missing(self.locale, key))
    }

    /// Lookup for rendering: degrades to the raw key instead of a blank.
    pub fn text<'a>(&'a self, key: &'a str) -> &'a str {
        match self.translate(key) {
            Ok(text) => text,
            Err(err) => {
                warn!(%err, "rendering raw dictionary key");
                key
            }
        }
    }

    /// Lookup with `{name}` placeholder substitution.
    pub fn format(&self, key: &str, args: &[(&str, &str)]) -> String {
        let mut out = self.text(key).to_string();
        for (name, value) in args {
            out = out.replace(&format!("{{{name}}}"), value);
        }
        out
    }

    fn parse(locale: &'static str, source: &str) -> ShellResult<Self> {
        let file: CatalogFile =
            serde_json::from_str(source).map_err(|e| ShellError::InvalidDictionary {
                locale: locale.to_string(),
                reason: e.to_string(),
            })?;
        Ok(Self {
            locale,
            version: file.version,
            entries: file.entries,
        })
    }
}

fn bundled_source(code: &str) -> Option<&'static str> {
    match code {
        "en" => Some(include_str!("../catalogs/en.json")),
        "fr" => Some(include_str!("../catalogs/fr.json")),
        "ar" => Some(include_str!("../catalogs/ar.json")),
        _ => None,
    }
}

type Catalogs = BTreeMap<&'static str, ShellResult<Dictionary>>;

fn catalogs() -> &'static Catalogs {
    static CATALOGS: OnceLock<Catalogs> = OnceLock::new();
    CATALOGS.get_or_init(|| {
        LOCALES
            .iter()
            .map(|locale| {
                let parsed = match bundled_source(locale.code) {
                    Some(source) => Dictionary::parse(locale.code, source),
                    None => Err(ShellError::InvalidDictionary {
                        locale: locale.code.to_string(),
                        reason: "no bundled catalog".to_string(),
                    }),
                };
                (locale.code, parsed)
            })
            .collect()
    })
}

/// Return the dictionary for `code`.
///
/// Fails with [`ShellError::LocaleNotFound`] only when `code` is not in the
/// Locale Table; callers are expected to have resolved the code already.
pub fn load_dictionary(code: &str) -> ShellResult<&'static Dictionary> {
    match catalogs().get(code) {
        Some(Ok(dictionary)) => Ok(dictionary),
        Some(Err(err)) => Err(err.clone()),
        None => Err(ShellError::locale_not_found(code)),
    }
}

/// A key some catalog lacks relative to the union of all catalogs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParityIssue {
    pub locale: &'static str,
    pub missing_key: String,
}

/// Compare the key sets of every bundled catalog.
///
/// Returns one issue per (locale, key) pair missing from that locale. A
/// catalog that fails to load is reported as an error.
pub fn check_catalog_parity() -> ShellResult<Vec<ParityIssue>> {
    let dictionaries = LOCALES
        .iter()
        .map(|l| load_dictionary(l.code))
        .collect::<ShellResult<Vec<_>>>()?;

    let union: BTreeSet<&str> = dictionaries.iter().flat_map(|d| d.keys()).collect();

    Ok(dictionaries
        .iter()
        .flat_map(|d| {
            union
                .iter()
                .filter(|key| !d.contains(**key))
                .map(|key| ParityIssue {
                    locale: d.locale(),
                    missing_key: key.to_string(),
                })
                .collect::<Vec<_>>()
        })
        .collect())
}
