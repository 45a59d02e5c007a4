//! Shell configuration from the environment.

use std::time::Duration;

use tracing::{debug, warn};

use adminshell_i18n::{DEFAULT_LOCALE, LocaleTable};
use adminshell_observability::LogFormat;

pub const API_URL_VAR: &str = "ADMINSHELL_API_URL";
pub const AUTH_TOKEN_VAR: &str = "ADMINSHELL_AUTH_TOKEN";
pub const DEFAULT_LOCALE_VAR: &str = "ADMINSHELL_DEFAULT_LOCALE";
pub const LOG_FORMAT_VAR: &str = "ADMINSHELL_LOG_FORMAT";
pub const REQUEST_TIMEOUT_VAR: &str = "ADMINSHELL_REQUEST_TIMEOUT_SECS";

const DEFAULT_API_URL: &str = "http://localhost:8080";
const DEFAULT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellConfig {
    pub api_base_url: String,
    pub auth_token: Option<String>,
    pub default_locale: String,
    pub log_format: LogFormat,
    pub request_timeout: Duration,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_URL.to_string(),
            auth_token: None,
            default_locale: DEFAULT_LOCALE.to_string(),
            log_format: LogFormat::Pretty,
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl ShellConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from any variable source; invalid values keep their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        match lookup(API_URL_VAR) {
            Some(url) if !url.trim().is_empty() => config.api_base_url = url.trim().to_string(),
            _ => debug!(default = DEFAULT_API_URL, "{API_URL_VAR} not set"),
        }

        config.auth_token = lookup(AUTH_TOKEN_VAR).filter(|t| !t.is_empty());

        if let Some(code) = lookup(DEFAULT_LOCALE_VAR) {
            config.default_locale = code.trim().to_string();
        }

        if let Some(raw) = lookup(LOG_FORMAT_VAR) {
            match raw.parse::<LogFormat>() {
                Ok(format) => config.log_format = format,
                Err(err) => warn!(%err, "{LOG_FORMAT_VAR} ignored"),
            }
        }

        if let Some(raw) = lookup(REQUEST_TIMEOUT_VAR) {
            match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => config.request_timeout = Duration::from_secs(secs),
                _ => warn!(value = %raw, "{REQUEST_TIMEOUT_VAR} ignored; expected a positive number of seconds"),
            }
        }

        config
    }

    /// The Locale Table with the configured default, or the built-in one when
    /// the configured code is unsupported.
    pub fn locale_table(&self) -> LocaleTable {
        LocaleTable::with_default(&self.default_locale).unwrap_or_else(|err| {
            warn!(%err, "unsupported default locale; using built-in default");
            LocaleTable::builtin()
        })
    }
}
