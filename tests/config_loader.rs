use mechanicum::config::{Config, ConfigError, DispatchConfig, LoggingConfig, StorageConfig};
use std::path::PathBuf;
use tempfile::TempDir;

fn write_config(content: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let path = temp_dir.path().join("config.toml");
    std::fs::write(&path, content).expect("Failed to write config");
    (temp_dir, path)
}

/// Test that Config::default() produces the documented values.
#[test]
fn test_config_default_values() {
    let config = Config::default();

    assert_eq!(config.dispatch.mailbox_capacity, 20);
    assert_eq!(config.dispatch.worker_threads, 8);
    assert_eq!(config.dispatch.thread_name, "state-writer");
    assert_eq!(config.logging.filter, "info");
    assert!(config.logging.file.is_none());
    assert_eq!(config.storage, StorageConfig::default());
    assert!(config.validate().is_ok());
}

#[test]
fn test_config_path_ends_with_expected() {
    let path = Config::config_path();
    assert!(path.ends_with("mechanicum/config.toml"));
}

#[test]
fn test_missing_file_yields_defaults() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");

    let config = Config::load_from(&temp_dir.path().join("absent.toml")).expect("defaults");

    assert_eq!(config, Config::default());
}

#[test]
fn test_partial_file_keeps_other_defaults() {
    let (_dir, path) = write_config(
        r#"
[dispatch]
mailbox_capacity = 4

[storage]
cache_dir = "/var/tmp/mech"
"#,
    );

    let config = Config::load_from(&path).expect("valid config");

    assert_eq!(
        config.dispatch,
        DispatchConfig {
            mailbox_capacity: 4,
            ..DispatchConfig::default()
        }
    );
    assert_eq!(config.logging, LoggingConfig::default());
    assert_eq!(config.storage.cache_dir(), PathBuf::from("/var/tmp/mech"));
    assert!(config.storage.external_dir().ends_with("mechanicum"));
}

#[test]
fn test_zero_capacity_is_rejected() {
    let (_dir, path) = write_config("[dispatch]\nmailbox_capacity = 0\n");

    let result = Config::load_from(&path);

    assert!(matches!(result, Err(ConfigError::ValidationError { .. })));
}

#[test]
fn test_zero_workers_is_rejected() {
    let config = DispatchConfig {
        worker_threads: 0,
        ..DispatchConfig::default()
    };

    let error = config.validate().expect_err("zero workers");
    assert!(error.to_string().contains("worker_threads"));
}

#[test]
fn test_invalid_toml_is_parse_error() {
    let (_dir, path) = write_config("[dispatch\nmailbox_capacity = ");

    let result = Config::load_from(&path);

    assert!(matches!(result, Err(ConfigError::ParseError { .. })));
}

#[test]
fn test_wrong_type_is_parse_error() {
    let (_dir, path) = write_config("[logging]\nfilter = 3\n");

    let result = Config::load_from(&path);

    assert!(matches!(result, Err(ConfigError::ParseError { .. })));
}
