//! Reader service configuration
//!
//! Two tiers:
//! 1. **Bootstrap**: command line > environment > TOML file > built-in
//!    defaults (root folder, port, logging, provider files, session scope)
//! 2. **Runtime**: the `settings` table (tick interval, queue radius), unless
//!    the TOML file pins a value

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use lectio_common::config::{ensure_root_folder, resolve_root_folder, TomlConfig};
use lectio_common::time::millis_to_duration;
use lectio_common::Result;
use sqlx::{Pool, Sqlite};

use crate::db::settings::{load_queue_radius, load_tick_interval};
use crate::reader::MAX_QUEUE_RADIUS;

/// Environment variable naming the root folder
pub const ROOT_FOLDER_ENV: &str = "LECTIO_ROOT_FOLDER";

pub const DEFAULT_PORT: u16 = 5730;
pub const DEFAULT_SESSION_SCOPE: &str = "default";
pub const DEFAULT_LOG_FILTER: &str = "lectio_rp=debug,tower_http=debug";

/// Command-line arguments for lectio-rp
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "lectio-rp")]
#[command(about = "Continuous reading player service for Lectio")]
#[command(version)]
pub struct Args {
    /// Port to listen on
    #[arg(short, long, env = "LECTIO_RP_PORT")]
    pub port: Option<u16>,

    /// Root folder holding the database (also read from LECTIO_ROOT_FOLDER)
    #[arg(short, long)]
    pub root_folder: Option<PathBuf>,

    /// Config file (defaults to the platform config location)
    #[arg(short, long, env = "LECTIO_CONFIG")]
    pub config: Option<PathBuf>,

    /// Scope key for persisted session values
    #[arg(long, env = "LECTIO_SESSION_SCOPE")]
    pub session_scope: Option<String>,

    /// JSON book list replacing the built-in canon
    #[arg(long)]
    pub bible: Option<PathBuf>,

    /// TOML reading plan
    #[arg(long)]
    pub plan: Option<PathBuf>,
}

impl Args {
    /// Load the TOML file named on the command line, or the platform default
    pub fn load_toml(&self) -> Result<Option<TomlConfig>> {
        match &self.config {
            Some(path) => TomlConfig::load(path).map(Some),
            None => Ok(TomlConfig::load_default()),
        }
    }
}

/// Resolved bootstrap configuration
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub root_folder: PathBuf,
    pub db_path: PathBuf,
    pub port: u16,
    pub log_filter: String,
    pub session_scope: String,
    pub bible_path: Option<PathBuf>,
    pub plan_path: Option<PathBuf>,
    tick_interval_ms: Option<u64>,
    queue_radius: Option<u32>,
}

impl Config {
    /// Merge arguments over the TOML file and create the root folder
    pub fn resolve(args: &Args, toml: Option<&TomlConfig>) -> Result<Self> {
        let root_folder = resolve_root_folder(args.root_folder.as_deref(), ROOT_FOLDER_ENV, toml);
        let db_path = ensure_root_folder(&root_folder)?;

        Ok(Self {
            root_folder,
            db_path,
            port: args
                .port
                .or_else(|| toml.and_then(|t| t.port))
                .unwrap_or(DEFAULT_PORT),
            log_filter: toml
                .and_then(|t| t.log_level.clone())
                .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string()),
            session_scope: args
                .session_scope
                .clone()
                .or_else(|| toml.and_then(|t| t.session_scope.clone()))
                .unwrap_or_else(|| DEFAULT_SESSION_SCOPE.to_string()),
            bible_path: args.bible.clone().or_else(|| toml.and_then(|t| t.bible_path.clone())),
            plan_path: args.plan.clone().or_else(|| toml.and_then(|t| t.plan_path.clone())),
            tick_interval_ms: toml.and_then(|t| t.tick_interval_ms),
            queue_radius: toml.and_then(|t| t.queue_radius),
        })
    }

    /// Timer tick period: TOML value if set, else the settings table
    pub async fn tick_interval(&self, db: &Pool<Sqlite>) -> Result<Duration> {
        let millis = match self.tick_interval_ms {
            Some(ms) => ms.clamp(10, 1000),
            None => load_tick_interval(db).await?,
        };
        Ok(millis_to_duration(millis))
    }

    /// Default queue radius: TOML value if set, else the settings table,
    /// capped at [`MAX_QUEUE_RADIUS`]
    pub async fn queue_radius(&self, db: &Pool<Sqlite>) -> Result<u32> {
        let radius = match self.queue_radius {
            Some(radius) => radius,
            None => load_queue_radius(db).await?,
        };
        Ok(radius.min(MAX_QUEUE_RADIUS))
    }
}
