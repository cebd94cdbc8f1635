//! Awakey API Server
//!
//! REST surface for the driver dashboard: session lifecycle, per-frame ticks,
//! alert acknowledgement and Prometheus metrics.

use alerting::{AlertManager, LogSink};
use axum::{
    extract::State,
    http::header,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use dms::{DmsConfig, Monitor, SessionStatus};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::subscriber::SetGlobalDefaultError;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;
use uuid::Uuid;

pub mod config;
mod error;
mod routes;

pub use crate::config::{AppConfig, LoggingConfig, ServerConfig, SettingsError};
pub use error::ApiError;
pub use routes::session::TickMode;
use routes::session::PacedSession;

/// Application state shared across handlers
pub struct AppState {
    /// The single monitoring session slot
    pub monitor: Arc<Monitor>,
    /// Throttles and delivers rising edges
    pub alerts: Arc<Mutex<AlertManager>>,
    /// Engine settings for start requests that carry none
    pub dms_defaults: DmsConfig,
    /// Tick driver and alert tasks, present only for paced sessions
    pub(crate) paced: Mutex<Option<PacedSession>>,
    /// Version string
    pub version: String,
    /// Start time
    pub start_time: Instant,
    metrics: Option<PrometheusHandle>,
}

impl AppState {
    /// Create new application state
    pub fn new(config: &AppConfig, metrics: Option<PrometheusHandle>) -> Self {
        let alerts = AlertManager::new(config.alerting.clone()).with_sink(Box::new(LogSink));
        Self {
            monitor: Arc::new(Monitor::new()),
            alerts: Arc::new(Mutex::new(alerts)),
            dms_defaults: config.dms.clone(),
            paced: Mutex::new(None),
            version: env!("CARGO_PKG_VERSION").to_string(),
            start_time: Instant::now(),
            metrics,
        }
    }
}

/// Health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: u64,
    pub version: String,
    pub uptime_seconds: u64,
    pub session: SessionStatus,
    pub session_id: Option<Uuid>,
}

/// Create the application router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/v1/health", get(health_handler))
        .route("/api/v1/session", get(routes::session::get_session))
        .route("/api/v1/session/start", post(routes::session::start))
        .route("/api/v1/session/stop", post(routes::session::stop))
        .route("/api/v1/session/tick", post(routes::session::tick))
        .route("/api/v1/session/frames", post(routes::session::enqueue_frame))
        .route("/api/v1/session/history", get(routes::session::get_history))
        .route("/api/v1/alerts", get(routes::alerts::get_alerts))
        .route("/api/v1/alerts/:number/ack", post(routes::alerts::acknowledge))
        .route("/metrics", get(metrics_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Health check handler
async fn health_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let timestamp = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);

    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp,
        version: state.version.clone(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        session: state.monitor.status(),
        session_id: state.monitor.session_id(),
    })
}

/// Prometheus scrape endpoint
async fn metrics_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let body = state
        .metrics
        .as_ref()
        .map(PrometheusHandle::render)
        .unwrap_or_default();
    ([(header::CONTENT_TYPE, "text/plain; version=0.0.4")], body)
}

/// Initialize logging
pub fn init_logging(level: Level, json: bool) -> Result<(), SetGlobalDefaultError> {
    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true);

    if json {
        tracing::subscriber::set_global_default(builder.json().finish())
    } else {
        tracing::subscriber::set_global_default(builder.finish())
    }
}

/// Install the global Prometheus recorder
pub fn install_metrics() -> Result<PrometheusHandle, BuildError> {
    PrometheusBuilder::new().install_recorder()
}

/// Run the server until Ctrl-C
pub async fn run_server(
    config: AppConfig,
    metrics: Option<PrometheusHandle>,
) -> Result<(), std::io::Error> {
    let state = Arc::new(AppState::new(&config, metrics));
    let app = create_router(Arc::clone(&state));

    info!("Starting API server on {}", config.server.bind_addr);

    let listener = tokio::net::TcpListener::bind(&config.server.bind_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(snapshot) = state.monitor.stop() {
        info!(
            "Session stopped on shutdown after {} ticks ({} alerts)",
            snapshot.tick, snapshot.drowsiness_alerts
        );
    }
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutdown signal received");
    }
}
