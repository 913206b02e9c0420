//! Client configuration resolved from `MEDQA_*` build-time variables.
//!
//! SYSTEM CONTEXT
//! ==============
//! A WASM bundle has no process environment at runtime, so overrides are
//! baked in with `option_env!` when the bundle is built. Every value has a
//! default so a plain build talks to a local backend.

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

use std::str::FromStr;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8080";
pub const DEFAULT_API_TIMEOUT_MS: u32 = 30_000;
pub const DEFAULT_TOKEN_KEY: &str = "token";
pub const DEFAULT_USER_KEY: &str = "userInfo";

/// `localStorage` keys holding the persisted session pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageKeys {
    pub token: String,
    pub user: String,
}

impl Default for StorageKeys {
    fn default() -> Self {
        Self { token: DEFAULT_TOKEN_KEY.to_owned(), user: DEFAULT_USER_KEY.to_owned() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    /// Backend origin without a trailing slash.
    pub base_url: String,
    pub timeout_ms: u32,
    /// Forward browser cookies with every request.
    pub with_credentials: bool,
    pub log_level: log::Level,
    pub storage_keys: StorageKeys,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE_URL.to_owned(),
            timeout_ms: DEFAULT_API_TIMEOUT_MS,
            with_credentials: true,
            log_level: log::Level::Info,
            storage_keys: StorageKeys::default(),
        }
    }
}

impl ApiConfig {
    /// Build config from variables captured at compile time.
    ///
    /// Optional:
    /// - `MEDQA_API_BASE_URL`: default `http://localhost:8080`
    /// - `MEDQA_API_TIMEOUT_MS`: default 30000
    /// - `MEDQA_API_WITH_CREDENTIALS`: `true` (default) or `false`
    /// - `MEDQA_LOG_LEVEL`: `error`, `warn`, `info` (default), `debug`, `trace`
    pub fn from_build_env() -> Self {
        Self::from_lookup(|key| match key {
            "MEDQA_API_BASE_URL" => option_env!("MEDQA_API_BASE_URL"),
            "MEDQA_API_TIMEOUT_MS" => option_env!("MEDQA_API_TIMEOUT_MS"),
            "MEDQA_API_WITH_CREDENTIALS" => option_env!("MEDQA_API_WITH_CREDENTIALS"),
            "MEDQA_LOG_LEVEL" => option_env!("MEDQA_LOG_LEVEL"),
            _ => None,
        })
    }

    /// Build config from an arbitrary key lookup. Unparseable values fall
    /// back to their defaults.
    pub fn from_lookup<'a, F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<&'a str>,
    {
        let defaults = Self::default();
        let base_url = lookup("MEDQA_API_BASE_URL")
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .unwrap_or(DEFAULT_API_BASE_URL)
            .trim_end_matches('/')
            .to_owned();

        Self {
            base_url,
            timeout_ms: parse_or("MEDQA_API_TIMEOUT_MS", lookup("MEDQA_API_TIMEOUT_MS"), defaults.timeout_ms),
            with_credentials: parse_bool_or(lookup("MEDQA_API_WITH_CREDENTIALS"), defaults.with_credentials),
            log_level: parse_or("MEDQA_LOG_LEVEL", lookup("MEDQA_LOG_LEVEL"), defaults.log_level),
            storage_keys: defaults.storage_keys,
        }
    }

    /// Join an API path onto the base URL.
    pub fn url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_owned();
        }
        if path.starts_with('/') {
            format!("{}{path}", self.base_url)
        } else {
            format!("{}/{path}", self.base_url)
        }
    }
}

fn parse_or<T: FromStr>(key: &str, raw: Option<&str>, default: T) -> T {
    let Some(raw) = raw.map(str::trim).filter(|v| !v.is_empty()) else {
        return default;
    };
    raw.parse().unwrap_or_else(|_| {
        log::warn!("config: ignoring invalid {key}={raw}");
        default
    })
}

fn parse_bool_or(raw: Option<&str>, default: bool) -> bool {
    match raw.map(|v| v.trim().to_ascii_lowercase()).as_deref() {
        Some("1" | "true" | "yes" | "on") => true,
        Some("0" | "false" | "no" | "off") => false,
        _ => default,
    }
}
