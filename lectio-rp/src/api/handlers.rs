//! HTTP request handlers
//!
//! Thin adapters from JSON requests to [`PlayerBehaviorState`] operations.
//!
//! [`PlayerBehaviorState`]: crate::reader::PlayerBehaviorState

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use lectio_common::{Error, Passage, ReaderBehavior};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::api::server::AppContext;
use crate::reader::{Queue, TimerStatus};

type ApiError = (StatusCode, Json<StatusResponse>);

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: String,
}

impl StatusResponse {
    fn ok() -> Json<Self> {
        Json(Self {
            status: "ok".to_string(),
        })
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: String,
    module: String,
    version: String,
}

#[derive(Debug, Deserialize)]
pub struct SectionQuery {
    index: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct SectionResponse {
    index: u32,
    passage: Option<Passage>,
}

#[derive(Debug, Deserialize)]
pub struct QueueQuery {
    radius: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct IndexBody {
    index: u32,
}

#[derive(Debug, Serialize)]
pub struct TimerResponse {
    timer: Option<TimerStatus>,
}

fn error_response(e: Error) -> ApiError {
    let status = match &e {
        Error::InvalidInput(_) => StatusCode::BAD_REQUEST,
        Error::NotFound(_) => StatusCode::NOT_FOUND,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status.is_server_error() {
        error!("Request failed: {}", e);
    }
    (
        status,
        Json(StatusResponse {
            status: format!("error: {}", e),
        }),
    )
}

// ============================================================================
// Health
// ============================================================================

/// GET /health
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        module: "reader_player".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============================================================================
// Behavior
// ============================================================================

/// GET /reader/behavior
pub async fn get_behavior(
    State(ctx): State<AppContext>,
) -> Result<Json<ReaderBehavior>, ApiError> {
    ctx.reader.get_behavior().await.map(Json).map_err(error_response)
}

/// POST /reader/behavior
pub async fn set_behavior(
    State(ctx): State<AppContext>,
    Json(behavior): Json<ReaderBehavior>,
) -> Result<Json<StatusResponse>, ApiError> {
    info!("Set behavior request: {}", behavior.kind());
    ctx.reader
        .set_behavior(behavior)
        .await
        .map_err(error_response)?;
    Ok(StatusResponse::ok())
}

// ============================================================================
// Resolution
// ============================================================================

/// GET /reader/section?index=N
pub async fn get_section(
    State(ctx): State<AppContext>,
    Query(query): Query<SectionQuery>,
) -> Result<Json<SectionResponse>, ApiError> {
    let index = match query.index {
        Some(index) => index,
        None => ctx.reader.current_index().await,
    };
    let passage = ctx
        .reader
        .get_section(Some(index))
        .await
        .map_err(error_response)?;
    Ok(Json(SectionResponse { index, passage }))
}

/// GET /reader/queue?radius=N
pub async fn get_queue(
    State(ctx): State<AppContext>,
    Query(query): Query<QueueQuery>,
) -> Result<Json<Queue>, ApiError> {
    let radius = query.radius.unwrap_or(ctx.queue_radius);
    ctx.reader.get_queue(radius).await.map(Json).map_err(error_response)
}

/// POST /reader/current - Update the currently open passage
pub async fn set_current_passage(
    State(ctx): State<AppContext>,
    Json(passage): Json<Passage>,
) -> Json<StatusResponse> {
    ctx.current.set(passage).await;
    StatusResponse::ok()
}

// ============================================================================
// Sequence index
// ============================================================================

/// GET /reader/index
pub async fn get_index(State(ctx): State<AppContext>) -> Json<IndexBody> {
    Json(IndexBody {
        index: ctx.reader.current_index().await,
    })
}

/// POST /reader/index
pub async fn set_index(
    State(ctx): State<AppContext>,
    Json(body): Json<IndexBody>,
) -> Result<Json<IndexBody>, ApiError> {
    ctx.reader.set_index(body.index).await.map_err(error_response)?;
    Ok(Json(body))
}

/// POST /reader/advance
pub async fn advance(State(ctx): State<AppContext>) -> Result<Json<IndexBody>, ApiError> {
    let index = ctx.reader.advance().await.map_err(error_response)?;
    Ok(Json(IndexBody { index }))
}

/// POST /reader/index/reset
pub async fn reset_index(State(ctx): State<AppContext>) -> Result<Json<IndexBody>, ApiError> {
    ctx.reader.reset_index().await.map_err(error_response)?;
    Ok(Json(IndexBody { index: 0 }))
}

// ============================================================================
// Timer
// ============================================================================

async fn timer_response(ctx: &AppContext) -> Json<TimerResponse> {
    Json(TimerResponse {
        timer: ctx.reader.timer_status().await,
    })
}

/// GET /reader/timer
pub async fn get_timer(State(ctx): State<AppContext>) -> Json<TimerResponse> {
    timer_response(&ctx).await
}

/// POST /reader/timer/start
pub async fn start_timer(State(ctx): State<AppContext>) -> Result<Json<TimerResponse>, ApiError> {
    ctx.reader.start_timer().await.map_err(error_response)?;
    Ok(timer_response(&ctx).await)
}

/// POST /reader/timer/stop
pub async fn stop_timer(State(ctx): State<AppContext>) -> Json<TimerResponse> {
    ctx.reader.stop_timer().await;
    timer_response(&ctx).await
}

/// POST /reader/timer/pause
pub async fn pause_timer(State(ctx): State<AppContext>) -> Json<TimerResponse> {
    ctx.reader.pause_timer().await;
    timer_response(&ctx).await
}

/// POST /reader/timer/play
pub async fn play_timer(State(ctx): State<AppContext>) -> Json<TimerResponse> {
    ctx.reader.play_timer().await;
    timer_response(&ctx).await
}

/// POST /reader/timer/resume - Play, starting a new timer if needed
pub async fn resume_timer(State(ctx): State<AppContext>) -> Result<Json<TimerResponse>, ApiError> {
    ctx.reader.resume_or_restart().await.map_err(error_response)?;
    Ok(timer_response(&ctx).await)
}

/// POST /reader/timer/restart
pub async fn restart_timer(State(ctx): State<AppContext>) -> Result<Json<TimerResponse>, ApiError> {
    ctx.reader.restart().await.map_err(error_response)?;
    Ok(timer_response(&ctx).await)
}
