use skillbridge::config::{Config, ConfigError, ConfigStore};
use skillbridge::session::Session;
use std::fs;
use tempfile::TempDir;

/// Test that Config::config_path() returns a path ending with the expected filename.
#[test]
fn test_config_path_ends_with_expected() {
    let path = Config::config_path();
    assert!(path.ends_with("skillbridge/config.toml"));
}

/// Test that every section is read from a full config file.
#[test]
fn test_full_config_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(
        &path,
        r#"
[api]
base_url = "https://skillbridge.example"
request_timeout_ms = 4000
connect_timeout_ms = 1000
accept_legacy_shapes = true

[retry]
max_attempts = 4
initial_delay_ms = 250
multiplier = 2.0

[queue]
debounce_ms = 150
pacing_ms = 0

[session]
user_id = "17"
user_name = "Grace"
role = "ROLE_ADMIN"
"#,
    )
    .unwrap();

    let config = Config::load_from(&path).unwrap();
    assert_eq!(config.api.base_url, "https://skillbridge.example");
    assert!(config.api.accept_legacy_shapes);
    assert_eq!(config.retry.max_attempts, 4);
    assert_eq!(config.retry.multiplier, 2.0);
    assert_eq!(config.queue.debounce_ms, 150);
    assert_eq!(config.queue.pacing_ms, 0);

    let session = Session::from_config(&config.session);
    assert_eq!(session.user_id().as_deref(), Some("17"));
    assert!(session.is_admin());
}

/// Test validation fails when the base URL is blank.
#[test]
fn test_validation_fails_empty_base_url() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "[api]\nbase_url = \"  \"\n").unwrap();

    match Config::load_from(&path).unwrap_err() {
        ConfigError::ValidationError { message } => {
            assert!(message.contains("base_url"));
        }
        other => panic!("Expected ValidationError, got {:?}", other),
    }
}

/// Test that reload picks up file changes and keeps the old config on error.
#[test]
fn test_store_reload() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "[queue]\ndebounce_ms = 200\n").unwrap();

    let store = ConfigStore::new(Config::load_from(&path).unwrap(), path.clone());
    assert_eq!(store.get().queue.debounce_ms, 200);

    fs::write(&path, "[queue]\ndebounce_ms = 50\n").unwrap();
    store.reload().unwrap();
    assert_eq!(store.get().queue.debounce_ms, 50);

    fs::write(&path, "[retry]\nmax_attempts = 0\n").unwrap();
    assert!(store.reload().is_err());
    assert_eq!(store.get().queue.debounce_ms, 50);
    assert_eq!(store.path(), path.as_path());
}
