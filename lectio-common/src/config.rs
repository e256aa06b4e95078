//! Configuration loading and root folder resolution

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Database file name inside the root folder
pub const DATABASE_FILE_NAME: &str = "lectio.db";

/// Optional settings read from `config.toml`
///
/// Every key is optional; missing keys fall back to compiled defaults.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct TomlConfig {
    pub root_folder: Option<PathBuf>,
    pub port: Option<u16>,
    pub log_level: Option<String>,
    /// Scope key for persisted session values (sequence index, timer elapsed)
    pub session_scope: Option<String>,
    pub tick_interval_ms: Option<u64>,
    pub queue_radius: Option<u32>,
    /// JSON file of `{name, chapter_count}` book views
    pub bible_path: Option<PathBuf>,
    /// TOML reading plan file
    pub plan_path: Option<PathBuf>,
}

impl TomlConfig {
    /// Parse a config file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = toml::from_str(&content)?;
        debug!("Loaded config file {}", path.display());
        Ok(config)
    }

    /// Load the platform config file if one exists
    ///
    /// A missing file is normal; a malformed one is logged and ignored so a
    /// bad edit never prevents startup.
    pub fn load_default() -> Option<Self> {
        let path = config_file_path().ok()?;
        match Self::load(&path) {
            Ok(config) => Some(config),
            Err(e) => {
                warn!("Ignoring config file {}: {}", path.display(), e);
                None
            }
        }
    }
}

/// Root folder resolution, in priority order:
/// 1. Command-line argument (highest priority)
/// 2. Environment variable
/// 3. TOML config file
/// 4. OS-dependent compiled default (fallback)
pub fn resolve_root_folder(
    cli_arg: Option<&Path>,
    env_var_name: &str,
    toml_config: Option<&TomlConfig>,
) -> PathBuf {
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    if let Ok(path) = std::env::var(env_var_name) {
        if !path.is_empty() {
            return PathBuf::from(path);
        }
    }

    if let Some(root_folder) = toml_config.and_then(|c| c.root_folder.clone()) {
        return root_folder;
    }

    default_root_folder()
}

/// Create the root folder if needed and return the database path inside it
pub fn ensure_root_folder(root_folder: &Path) -> Result<PathBuf> {
    if !root_folder.exists() {
        std::fs::create_dir_all(root_folder)?;
        debug!("Created root folder {}", root_folder.display());
    }
    if !root_folder.is_dir() {
        return Err(Error::Config(format!(
            "Root folder is not a directory: {}",
            root_folder.display()
        )));
    }
    Ok(root_folder.join(DATABASE_FILE_NAME))
}

/// Get the configuration file path for the platform
pub fn config_file_path() -> Result<PathBuf> {
    if cfg!(target_os = "linux") {
        // ~/.config/lectio/config.toml first, then /etc/lectio/config.toml
        let user_config = dirs::config_dir().map(|d| d.join("lectio").join("config.toml"));
        let system_config = PathBuf::from("/etc/lectio/config.toml");

        if let Some(path) = user_config {
            if path.exists() {
                return Ok(path);
            }
        }
        if system_config.exists() {
            return Ok(system_config);
        }
        return Err(Error::Config("No config file found".to_string()));
    }

    let path = dirs::config_dir()
        .map(|d| d.join("lectio").join("config.toml"))
        .ok_or_else(|| Error::Config("Could not determine config directory".to_string()))?;

    if path.exists() {
        Ok(path)
    } else {
        Err(Error::Config(format!("Config file not found: {:?}", path)))
    }
}

/// Get OS-dependent default root folder path
pub fn default_root_folder() -> PathBuf {
    if cfg!(target_os = "linux") {
        // ~/.local/share/lectio
        dirs::data_local_dir()
            .map(|d| d.join("lectio"))
            .unwrap_or_else(|| PathBuf::from("/var/lib/lectio"))
    } else if cfg!(target_os = "macos") {
        // ~/Library/Application Support/lectio
        dirs::data_dir()
            .map(|d| d.join("lectio"))
            .unwrap_or_else(|| PathBuf::from("/Library/Application Support/lectio"))
    } else if cfg!(target_os = "windows") {
        // %LOCALAPPDATA%\lectio
        dirs::data_local_dir()
            .map(|d| d.join("lectio"))
            .unwrap_or_else(|| PathBuf::from("C:\\ProgramData\\lectio"))
    } else {
        PathBuf::from("./lectio_data")
    }
}
