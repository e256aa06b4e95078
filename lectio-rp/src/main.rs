//! Reader Player (lectio-rp) - Main entry point

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use lectio_common::db::init_database;
use lectio_common::events::EventBus;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use lectio_rp::api::{self, AppContext};
use lectio_rp::config::{Args, Config};
use lectio_rp::db::{SqliteBehaviorStore, SqliteSessionStore};
use lectio_rp::providers::{ReaderContext, ReadingPlan, SharedCurrentPassage, StaticBible};
use lectio_rp::reader::{PlayerBehaviorState, ReaderDeps};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse();
    let toml = args.load_toml().context("Failed to load config file")?;
    let config = Config::resolve(&args, toml.as_ref()).context("Failed to resolve configuration")?;

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log_filter.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Lectio Reader Player on port {}", config.port);
    info!("Root folder: {}", config.root_folder.display());

    let db = init_database(&config.db_path)
        .await
        .context("Failed to initialize database")?;

    // Reference data
    let bible = match &config.bible_path {
        Some(path) => StaticBible::from_json_file(path).context("Failed to load bible structure")?,
        None => StaticBible::canon(),
    };
    let plan = match &config.plan_path {
        Some(path) => ReadingPlan::load(path).context("Failed to load reading plan")?,
        None => {
            warn!("No reading plan configured; daily behaviors will be empty");
            ReadingPlan::empty()
        }
    };
    let current = Arc::new(SharedCurrentPassage::default());

    let deps = ReaderDeps {
        context: ReaderContext::new(Arc::new(bible), current.clone(), Arc::new(plan)),
        behaviors: Arc::new(SqliteBehaviorStore::new(db.clone())),
        session: Arc::new(SqliteSessionStore::new(db.clone(), config.session_scope.clone())),
        events: EventBus::default(),
        tick_interval: config.tick_interval(&db).await?,
    };

    let reader = Arc::new(
        PlayerBehaviorState::load(deps)
            .await
            .context("Failed to restore reader state")?,
    );
    info!("Reader initialized (session scope '{}')", config.session_scope);

    let ctx = AppContext {
        reader: reader.clone(),
        current,
        queue_radius: config.queue_radius(&db).await?,
    };

    api::run(config.port, ctx, shutdown_signal())
        .await
        .context("Server error")?;

    reader.shutdown().await;
    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
