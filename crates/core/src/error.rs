//! Shell-wide error taxonomy.

use thiserror::Error;

/// Result type used across the identity/locale layer.
pub type ShellResult<T> = Result<T, ShellError>;

/// Errors raised by the identity, session and locale layer.
///
/// None of these are meant to reach the rendering layer as a panic: each one is
/// converted to explicit state (a fallback locale, the raw key, an empty list,
/// an empty view) where it is handled.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ShellError {
    /// The locale code is not in the Locale Table.
    #[error("locale not found: {0}")]
    LocaleNotFound(String),

    /// A text key is absent from the loaded dictionary.
    #[error("dictionary key missing: '{key}' (locale {locale})")]
    DictionaryKeyMissing { locale: String, key: String },

    /// Bundled dictionary content failed to parse.
    #[error("invalid dictionary for locale {locale}: {reason}")]
    InvalidDictionary { locale: String, reason: String },

    /// Retrieving session activity failed at the transport level.
    #[error("session fetch failed: {0}")]
    SessionFetchFailed(String),

    /// An operation required an identity but the store is empty.
    #[error("unauthenticated")]
    Unauthenticated,

    /// An identifier failed to parse.
    #[error("invalid identifier: {0}")]
    InvalidId(String),
}

impl ShellError {
    pub fn locale_not_found(code: impl Into<String>) -> Self {
        Self::LocaleNotFound(code.into())
    }

    pub fn key_missing(locale: impl Into<String>, key: impl Into<String>) -> Self {
        Self::DictionaryKeyMissing {
            locale: locale.into(),
            key: key.into(),
        }
    }

    pub fn session_fetch(msg: impl Into<String>) -> Self {
        Self::SessionFetchFailed(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }
}
