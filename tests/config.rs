//! Configuration loading and validation.

use planboard::config::Config;

#[test]
fn default_config_is_valid() {
    let config = Config::default();
    assert!(config.validate().is_ok());
    assert!(!config.sync.enabled_by_default);
    assert_eq!(config.logging.level, "info");
}

#[test]
fn parses_a_partial_config_file() {
    let toml = r#"
        [sync]
        retry_max_attempts = 5

        [remote]
        base_url = "https://store.example.com/api"
    "#;
    let config: Config = toml::from_str(toml).unwrap();
    assert!(config.validate().is_ok());
    assert_eq!(config.sync.retry_max_attempts, 5);
    assert_eq!(config.remote.base_url, "https://store.example.com/api");
    // Unspecified sections keep their defaults.
    assert_eq!(config.remote.api_token_env, "PLANBOARD_API_TOKEN");
    assert!(!config.logging.enabled);
}

#[test]
fn rejects_zero_retry_attempts() {
    let mut config = Config::default();
    config.sync.retry_max_attempts = 0;
    assert!(config.validate().is_err());
}

#[test]
fn rejects_excessive_backoff() {
    let mut config = Config::default();
    config.sync.retry_backoff_ms = 120_000;
    assert!(config.validate().is_err());
}

#[test]
fn rejects_non_http_base_url() {
    let mut config = Config::default();
    config.remote.base_url = "ftp://nope".into();
    assert!(config.validate().is_err());

    config.remote.base_url = String::new();
    assert!(config.validate().is_err());
}

#[test]
fn rejects_unknown_log_level() {
    let mut config = Config::default();
    config.logging.level = "loud".into();
    assert!(config.validate().is_err());
}

#[test]
fn retry_policy_reflects_settings() {
    let mut config = Config::default();
    config.sync.retry_max_attempts = 4;
    config.sync.retry_backoff_ms = 250;
    let policy = config.sync.retry_policy();
    assert_eq!(policy.max_attempts, 4);
    assert_eq!(policy.backoff, std::time::Duration::from_millis(250));
}
