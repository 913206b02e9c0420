use super::*;
use std::collections::HashMap;

fn config_from(pairs: &[(&'static str, &'static str)]) -> ApiConfig {
    let vars: HashMap<&str, &str> = pairs.iter().copied().collect();
    ApiConfig::from_lookup(|key| vars.get(key).copied())
}

#[test]
fn from_lookup_defaults_when_nothing_set() {
    let cfg = config_from(&[]);
    assert_eq!(cfg, ApiConfig::default());
    assert_eq!(cfg.base_url, DEFAULT_API_BASE_URL);
    assert_eq!(cfg.timeout_ms, DEFAULT_API_TIMEOUT_MS);
    assert!(cfg.with_credentials);
    assert_eq!(cfg.log_level, log::Level::Info);
    assert_eq!(cfg.storage_keys.token, "token");
    assert_eq!(cfg.storage_keys.user, "userInfo");
}

#[test]
fn from_lookup_parses_overrides() {
    let cfg = config_from(&[
        ("MEDQA_API_BASE_URL", "https://qna.example.test/"),
        ("MEDQA_API_TIMEOUT_MS", "5000"),
        ("MEDQA_API_WITH_CREDENTIALS", "false"),
        ("MEDQA_LOG_LEVEL", "debug"),
    ]);
    assert_eq!(cfg.base_url, "https://qna.example.test");
    assert_eq!(cfg.timeout_ms, 5000);
    assert!(!cfg.with_credentials);
    assert_eq!(cfg.log_level, log::Level::Debug);
}

#[test]
fn from_lookup_falls_back_on_invalid_values() {
    let cfg = config_from(&[
        ("MEDQA_API_BASE_URL", "   "),
        ("MEDQA_API_TIMEOUT_MS", "soon"),
        ("MEDQA_API_WITH_CREDENTIALS", "maybe"),
        ("MEDQA_LOG_LEVEL", "loud"),
    ]);
    assert_eq!(cfg, ApiConfig::default());
}

#[test]
fn url_joins_paths_with_and_without_leading_slash() {
    let cfg = ApiConfig::default();
    assert_eq!(cfg.url("/api/auth/login"), "http://localhost:8080/api/auth/login");
    assert_eq!(cfg.url("api/auth/login"), "http://localhost:8080/api/auth/login");
}

#[test]
fn url_passes_absolute_urls_through() {
    let cfg = ApiConfig::default();
    assert_eq!(cfg.url("https://other.test/health"), "https://other.test/health");
}
