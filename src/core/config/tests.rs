use super::data::{Config, ConfigKey, EndpointError, SettingError};
use super::io::ConfigError;
use std::fs;
use tempfile::TempDir;

#[test]
fn test_load_nonexistent_config() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let config_path = temp_dir.path().join("nonexistent_config.toml");

    let config = Config::load_from_path(&config_path).expect("Failed to load config");

    assert_eq!(config, Config::default());
    assert!(config.markdown_enabled());
    assert!(config.syntax_enabled());
}

#[test]
fn test_config_persistence_lifecycle() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let config_path = temp_dir.path().join("nested").join("config.toml");

    let mut config = Config::default();
    config.set(ConfigKey::Host, "chat.example:8080").unwrap();
    config.set(ConfigKey::Markdown, "off").unwrap();
    config.set(ConfigKey::Theme, "Light").unwrap();
    config
        .save_to_path(&config_path)
        .expect("Failed to save config");

    let loaded = Config::load_from_path(&config_path).expect("Failed to load config");
    assert_eq!(loaded.host.as_deref(), Some("chat.example:8080"));
    assert_eq!(loaded.markdown, Some(false));
    assert_eq!(loaded.theme.as_deref(), Some("light"));

    let mut loaded = loaded;
    loaded.unset(ConfigKey::Host);
    loaded.save_to_path(&config_path).unwrap();
    let reloaded = Config::load_from_path(&config_path).unwrap();
    assert_eq!(reloaded.host, None);
    assert_eq!(reloaded.markdown, Some(false));
}

#[test]
fn test_parse_error_names_the_file() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    fs::write(&config_path, "markdown = \"sometimes\"\n").unwrap();

    let err = Config::load_from_path(&config_path).unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }));
    assert!(err.to_string().starts_with("Failed to parse config at"));
}

#[test]
fn test_default_endpoint() {
    let endpoint = Config::default().endpoint().unwrap();
    assert_eq!(endpoint.as_str(), "ws://localhost:9000/ws");
}

#[test]
fn test_url_overrides_host() {
    let config = Config {
        host: Some("ignored:1".into()),
        url: Some("wss://chat.example/socket".into()),
        ..Default::default()
    };
    assert_eq!(config.endpoint().unwrap().as_str(), "wss://chat.example/socket");
}

#[test]
fn test_rejects_non_websocket_endpoints() {
    let config = Config {
        url: Some("http://chat.example/ws".into()),
        ..Default::default()
    };
    assert!(matches!(
        config.endpoint(),
        Err(EndpointError::UnsupportedScheme(scheme)) if scheme == "http"
    ));

    let config = Config {
        url: Some("not a url".into()),
        ..Default::default()
    };
    assert!(matches!(config.endpoint(), Err(EndpointError::Invalid { .. })));
}

#[test]
fn test_setting_validation() {
    let mut config = Config::default();
    assert!(matches!(
        ConfigKey::parse("colour"),
        Err(SettingError::UnknownKey(_))
    ));
    assert_eq!(ConfigKey::parse(" SYNTAX ").unwrap(), ConfigKey::Syntax);
    assert!(config.set(ConfigKey::Syntax, "maybe").is_err());
    assert!(config.set(ConfigKey::Theme, "solarized").is_err());
    assert!(config.set(ConfigKey::Host, "   ").is_err());
    assert_eq!(config, Config::default());
}

#[test]
fn test_summary_lists_every_key() {
    let summary = Config::default().render_summary();
    for key in ConfigKey::ALL {
        assert!(summary.contains(&format!("  {}: ", key.as_str())));
    }
    assert!(summary.contains("endpoint: ws://localhost:9000/ws"));
}
