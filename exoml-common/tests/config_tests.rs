//! Unit tests for configuration layering and graceful degradation
//!
//! Tests cover:
//! - Priority order CLI → ENV → TOML → compiled default
//! - TOML parsing of every section, with defaults for omitted keys
//! - Explicit config files that are missing or malformed
//!
//! Note: Uses serial_test crate to prevent ENV variable race conditions.
//! Tests that manipulate EXOML_* or PORT are marked with #[serial].

use exoml_common::config::{
    load_toml_config, CliOverrides, MissingValueFill, PreprocessingPolicy, ServiceConfig,
    TomlConfig, ENV_MODEL_DIR,
};
use exoml_common::Error;
use serial_test::serial;
use std::env;
use std::io::Write;
use std::path::PathBuf;
use tempfile::NamedTempFile;

fn clear_env() {
    for name in [ENV_MODEL_DIR, "EXOML_HOST", "EXOML_PORT", "PORT", "EXOML_PRELOAD"] {
        env::remove_var(name);
    }
}

#[test]
#[serial]
fn test_defaults_without_any_layer() {
    clear_env();

    let config = ServiceConfig::resolve(CliOverrides::default(), TomlConfig::default()).unwrap();

    assert_eq!(config.model_dir, PathBuf::from("model_files"));
    assert_eq!(config.host, "0.0.0.0");
    assert_eq!(config.port, 5001);
    assert!(config.preload);
    assert_eq!(config.logging.level, "info");
    assert_eq!(config.artifacts.model, "exoplanet_bilstm.onnx");
    assert_eq!(config.preprocessing.policy, PreprocessingPolicy::Flattened);
    assert_eq!(config.preprocessing.missing_values, MissingValueFill::Zero);
    assert_eq!(config.bind_addr(), "0.0.0.0:5001");
}

#[test]
#[serial]
fn test_env_overrides_toml() {
    clear_env();
    env::set_var(ENV_MODEL_DIR, "/tmp/exoml-env-models");
    env::set_var("PORT", "8080");

    let file = TomlConfig::from_toml_str(
        r#"
        model_dir = "/srv/models"
        port = 7000
        "#,
    )
    .unwrap();

    let config = ServiceConfig::resolve(CliOverrides::default(), file).unwrap();
    assert_eq!(config.model_dir, PathBuf::from("/tmp/exoml-env-models"));
    assert_eq!(config.port, 8080);

    clear_env();
}

#[test]
#[serial]
fn test_exoml_port_takes_precedence_over_port() {
    clear_env();
    env::set_var("EXOML_PORT", "6001");
    env::set_var("PORT", "6002");

    let config = ServiceConfig::resolve(CliOverrides::default(), TomlConfig::default()).unwrap();
    assert_eq!(config.port, 6001);

    clear_env();
}

#[test]
#[serial]
fn test_cli_overrides_env() {
    clear_env();
    env::set_var(ENV_MODEL_DIR, "/tmp/exoml-env-models");

    let cli = CliOverrides {
        model_dir: Some(PathBuf::from("/tmp/exoml-cli-models")),
        preload: Some(false),
        ..CliOverrides::default()
    };

    let config = ServiceConfig::resolve(cli, TomlConfig::default()).unwrap();
    assert_eq!(config.model_dir, PathBuf::from("/tmp/exoml-cli-models"));
    assert!(!config.preload);

    clear_env();
}

#[test]
#[serial]
fn test_unparseable_env_value_is_config_error() {
    clear_env();
    env::set_var("PORT", "not-a-port");

    let result = ServiceConfig::resolve(CliOverrides::default(), TomlConfig::default());
    assert!(matches!(result, Err(Error::Config(_))));

    clear_env();
}

#[test]
fn test_toml_all_sections() {
    let file = TomlConfig::from_toml_str(
        r#"
        host = "127.0.0.1"
        preload = false

        [logging]
        level = "debug"

        [artifacts]
        model = "bilstm_v2.onnx"

        [preprocessing]
        policy = "aligned"
        missing_values = "column_mean"

        [timeouts]
        artifact_load_ms = 0
        inference_ms = 500
        "#,
    )
    .unwrap();

    assert_eq!(file.host.as_deref(), Some("127.0.0.1"));
    assert_eq!(file.preload, Some(false));
    assert_eq!(file.logging.level, "debug");
    assert_eq!(file.artifacts.model, "bilstm_v2.onnx");
    // Omitted keys keep their defaults
    assert_eq!(file.artifacts.scaler, "scaler.json");
    assert_eq!(file.preprocessing.policy, PreprocessingPolicy::Aligned);
    assert_eq!(file.preprocessing.missing_values, MissingValueFill::ColumnMean);
    assert!(file.timeouts.artifact_load().is_none());
    assert_eq!(file.timeouts.inference_ms, 500);
}

#[test]
fn test_unknown_policy_rejected() {
    let result = TomlConfig::from_toml_str(
        r#"
        [preprocessing]
        policy = "interleaved"
        "#,
    );
    assert!(matches!(result, Err(Error::Toml(_))));
}

#[test]
fn test_explicit_config_file_loaded() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "port = 5999").unwrap();
    writeln!(file, "[artifacts]").unwrap();
    writeln!(file, "metadata = \"meta.json\"").unwrap();

    let config = load_toml_config(Some(file.path())).unwrap();
    assert_eq!(config.port, Some(5999));
    assert_eq!(config.artifacts.metadata, "meta.json");
}

#[test]
fn test_explicit_missing_config_file_is_error() {
    let path = PathBuf::from("/tmp/exoml-definitely-missing/config.toml");
    let result = load_toml_config(Some(&path));
    assert!(matches!(result, Err(Error::Config(_))));
}
