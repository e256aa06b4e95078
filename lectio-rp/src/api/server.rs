//! HTTP server setup and routing
//!
//! Sets up Axum HTTP server with routes for reader control endpoints and SSE.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use lectio_common::Result;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::providers::SharedCurrentPassage;
use crate::reader::PlayerBehaviorState;

/// Shared application context passed to all handlers
#[derive(Clone)]
pub struct AppContext {
    pub reader: Arc<PlayerBehaviorState>,
    /// Writable side of the reader's current-passage provider
    pub current: Arc<SharedCurrentPassage>,
    /// Radius used when `/reader/queue` is called without one
    pub queue_radius: u32,
}

/// Build the router with all routes
pub fn build_router(ctx: AppContext) -> Router {
    Router::new()
        // Health endpoint
        .route("/health", get(super::handlers::health))

        // Behavior
        .route("/reader/behavior", get(super::handlers::get_behavior))
        .route("/reader/behavior", post(super::handlers::set_behavior))

        // Resolution
        .route("/reader/section", get(super::handlers::get_section))
        .route("/reader/queue", get(super::handlers::get_queue))
        .route("/reader/current", post(super::handlers::set_current_passage))

        // Sequence index
        .route("/reader/index", get(super::handlers::get_index))
        .route("/reader/index", post(super::handlers::set_index))
        .route("/reader/index/reset", post(super::handlers::reset_index))
        .route("/reader/advance", post(super::handlers::advance))

        // Timer
        .route("/reader/timer", get(super::handlers::get_timer))
        .route("/reader/timer/start", post(super::handlers::start_timer))
        .route("/reader/timer/stop", post(super::handlers::stop_timer))
        .route("/reader/timer/pause", post(super::handlers::pause_timer))
        .route("/reader/timer/play", post(super::handlers::play_timer))
        .route("/reader/timer/resume", post(super::handlers::resume_timer))
        .route("/reader/timer/restart", post(super::handlers::restart_timer))

        // SSE event stream
        .route("/events", get(super::sse::event_stream))

        // Attach application context
        .with_state(ctx)

        .layer(TraceLayer::new_for_http())

        // Enable CORS for local access
        .layer(CorsLayer::permissive())
}

/// Run HTTP API server until `shutdown` resolves
pub async fn run<F>(port: u16, ctx: AppContext, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = build_router(ctx);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("Starting HTTP server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    Ok(())
}
