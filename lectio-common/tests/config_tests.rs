//! Unit tests for configuration and root folder resolution
//!
//! Tests cover:
//! - Priority order: CLI argument > environment > TOML > compiled default
//! - TOML config parsing with partial keys
//! - Root folder creation and database path
//!
//! Note: Uses serial_test to prevent environment variable races.
//! Tests that manipulate LECTIO_TEST_ROOT are marked with #[serial].

use lectio_common::config::{
    default_root_folder, ensure_root_folder, resolve_root_folder, TomlConfig, DATABASE_FILE_NAME,
};
use serial_test::serial;
use std::env;
use std::io::Write;
use std::path::{Path, PathBuf};

const ENV_VAR: &str = "LECTIO_TEST_ROOT";

#[test]
#[serial]
fn test_no_overrides_uses_default() {
    env::remove_var(ENV_VAR);

    let root_folder = resolve_root_folder(None, ENV_VAR, None);

    assert!(!root_folder.as_os_str().is_empty());
    assert_eq!(root_folder, default_root_folder());
}

#[test]
#[serial]
fn test_cli_argument_wins() {
    env::set_var(ENV_VAR, "/tmp/lectio-from-env");
    let toml = TomlConfig {
        root_folder: Some(PathBuf::from("/tmp/lectio-from-toml")),
        ..Default::default()
    };

    let root_folder = resolve_root_folder(Some(Path::new("/tmp/lectio-from-cli")), ENV_VAR, Some(&toml));
    assert_eq!(root_folder, PathBuf::from("/tmp/lectio-from-cli"));

    env::remove_var(ENV_VAR);
}

#[test]
#[serial]
fn test_env_beats_toml() {
    env::set_var(ENV_VAR, "/tmp/lectio-from-env");
    let toml = TomlConfig {
        root_folder: Some(PathBuf::from("/tmp/lectio-from-toml")),
        ..Default::default()
    };

    let root_folder = resolve_root_folder(None, ENV_VAR, Some(&toml));
    assert_eq!(root_folder, PathBuf::from("/tmp/lectio-from-env"));

    env::remove_var(ENV_VAR);
}

#[test]
#[serial]
fn test_empty_env_var_is_ignored() {
    env::set_var(ENV_VAR, "");
    let toml = TomlConfig {
        root_folder: Some(PathBuf::from("/tmp/lectio-from-toml")),
        ..Default::default()
    };

    let root_folder = resolve_root_folder(None, ENV_VAR, Some(&toml));
    assert_eq!(root_folder, PathBuf::from("/tmp/lectio-from-toml"));

    env::remove_var(ENV_VAR);
}

#[test]
fn test_toml_partial_keys() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "port = 5999").unwrap();
    writeln!(file, "session_scope = \"evening\"").unwrap();
    writeln!(file, "tick_interval_ms = 250").unwrap();

    let config = TomlConfig::load(file.path()).unwrap();
    assert_eq!(config.port, Some(5999));
    assert_eq!(config.session_scope.as_deref(), Some("evening"));
    assert_eq!(config.tick_interval_ms, Some(250));
    assert_eq!(config.root_folder, None);
    assert_eq!(config.queue_radius, None);
}

#[test]
fn test_toml_malformed_is_error() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "port = \"not a number\"").unwrap();

    assert!(TomlConfig::load(file.path()).is_err());
}

#[test]
fn test_ensure_root_folder_creates_directory() {
    let temp = tempfile::tempdir().unwrap();
    let root = temp.path().join("nested").join("lectio");

    let db_path = ensure_root_folder(&root).unwrap();
    assert!(root.is_dir());
    assert_eq!(db_path, root.join(DATABASE_FILE_NAME));

    // Idempotent
    assert!(ensure_root_folder(&root).is_ok());
}

#[test]
fn test_ensure_root_folder_rejects_file() {
    let file = tempfile::NamedTempFile::new().unwrap();
    assert!(ensure_root_folder(file.path()).is_err());
}
