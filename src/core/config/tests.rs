use super::data::{Config, DEFAULT_API_BASE_URL};
use super::io::ConfigError;
use super::keys::ConfigKey;
use std::time::Duration;
use tempfile::TempDir;

#[test]
fn test_load_nonexistent_config() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let config_path = temp_dir.path().join("nonexistent_config.toml");

    let config = Config::load_from_path(&config_path).expect("Failed to load config");

    assert_eq!(config, Config::default());
}

#[test]
fn test_config_persistence_lifecycle() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let config_path = temp_dir.path().join("nested").join("config.toml");

    let mut config = Config::default();
    config
        .set_value(ConfigKey::ApiBaseUrl, "https://functions.test/")
        .expect("valid url");
    config
        .set_value(ConfigKey::HistoryLimit, "25")
        .expect("valid limit");
    config.save_to_path(&config_path).expect("Failed to save config");

    let loaded = Config::load_from_path(&config_path).expect("Failed to load config");
    assert_eq!(loaded.api_base_url.as_deref(), Some("https://functions.test"));
    assert_eq!(loaded.history_limit(), 25);

    let mut loaded = loaded;
    loaded.unset_value(ConfigKey::HistoryLimit);
    loaded.save_to_path(&config_path).expect("Failed to save config");
    let reloaded = Config::load_from_path(&config_path).expect("Failed to load config");
    assert_eq!(reloaded.history_limit, None);
    assert_eq!(reloaded.history_limit(), 50);
}

#[test]
fn invalid_toml_reports_parse_error_with_path() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let config_path = temp_dir.path().join("config.toml");
    std::fs::write(&config_path, "history_limit = \"lots\"").expect("write");

    let err = Config::load_from_path(&config_path).expect_err("should fail");
    assert!(matches!(err, ConfigError::Parse { .. }));
    assert!(err.to_string().contains("config.toml"));
}

#[test]
fn api_base_url_precedence() {
    let config = Config {
        api_base_url: Some("https://file.test".into()),
        ..Default::default()
    };
    assert_eq!(
        config.resolve_api_base_url(Some("https://flag.test"), Some("https://env.test".into())),
        "https://flag.test"
    );
    assert_eq!(
        config.resolve_api_base_url(None, Some("https://env.test".into())),
        "https://env.test"
    );
    assert_eq!(config.resolve_api_base_url(None, Some(" ".into())), "https://file.test");
    assert_eq!(
        Config::default().resolve_api_base_url(None, None),
        DEFAULT_API_BASE_URL
    );
}

#[test]
fn defaults_apply_for_missing_or_zero_values() {
    let config = Config {
        character_page_size: Some(0),
        ..Default::default()
    };
    assert_eq!(config.character_page_size(), 20);
    assert_eq!(config.history_limit(), 50);
    assert_eq!(config.error_banner_duration(), Duration::from_secs(5));
}

#[test]
fn set_value_validates_input() {
    let mut config = Config::default();
    assert!(config.set_value(ConfigKey::ApiBaseUrl, "ftp://nope").is_err());
    assert!(config.set_value(ConfigKey::CharacterPageSize, "0").is_err());
    assert!(config.set_value(ConfigKey::ErrorBannerSecs, "-3").is_err());
    assert!(config.set_value(ConfigKey::ErrorBannerSecs, "8").is_ok());
    assert_eq!(config.error_banner_duration(), Duration::from_secs(8));
    assert_eq!(config, Config { error_banner_secs: Some(8), ..Default::default() });
}

#[test]
fn config_keys_parse_from_cli_names() {
    assert_eq!("history-limit".parse::<ConfigKey>(), Ok(ConfigKey::HistoryLimit));
    let err = "theme".parse::<ConfigKey>().expect_err("unknown key");
    assert!(err.contains("api-base-url"));
}
