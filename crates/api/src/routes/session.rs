//! Session Routes

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use dms::{
    DetectionSnapshot, DmsConfig, Frame, Observation, SessionStatus, TickDriver, TickOutcome,
};
use alerting::AlertNotification;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{ApiError, AppState};

/// Frames buffered for the paced driver before uploads are refused
const FRAME_QUEUE_DEPTH: usize = 64;

/// Who drives the ticks of a session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TickMode {
    /// Every `POST /session/tick` is one tick
    #[default]
    Direct,
    /// Frames are queued and ticked once per sampling period
    Paced,
}

/// Body of a start request
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct StartRequest {
    /// Overrides the service's engine settings for this session
    pub config: Option<DmsConfig>,
    pub mode: TickMode,
}

#[derive(Debug, Serialize)]
pub struct StartResponse {
    pub session_id: Uuid,
    pub mode: TickMode,
    pub config: DmsConfig,
}

#[derive(Debug, Serialize)]
pub struct StopResponse {
    pub stopped: bool,
    pub final_snapshot: Option<DetectionSnapshot>,
}

/// One frame of classifier output
#[derive(Debug, Deserialize)]
pub struct FrameRequest {
    pub readings: Frame,
}

#[derive(Debug, Serialize)]
pub struct TickResponse {
    #[serde(flatten)]
    pub outcome: TickOutcome,
    /// Present when a rising edge passed alert throttling
    pub notification: Option<AlertNotification>,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub status: SessionStatus,
    pub session_id: Option<Uuid>,
    pub config: Option<DmsConfig>,
    pub snapshot: Option<DetectionSnapshot>,
}

/// Query parameters for the history endpoint
#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    dms::config::HISTORY_SIZE
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub observations: Vec<Observation>,
    pub count: usize,
}

/// Start a session
pub async fn start(
    State(state): State<Arc<AppState>>,
    body: Option<Json<StartRequest>>,
) -> Result<Json<StartResponse>, ApiError> {
    let request = body.map(|Json(request)| request).unwrap_or_default();
    let config = request
        .config
        .unwrap_or_else(|| state.dms_defaults.clone());

    let session_id = state.monitor.start(config.clone())?;
    if request.mode == TickMode::Paced {
        spawn_paced_driver(&state, session_id, config.sampling_period()).await;
    }

    Ok(Json(StartResponse {
        session_id,
        mode: request.mode,
        config,
    }))
}

/// Background tasks serving one paced session
pub(crate) struct PacedSession {
    frames: mpsc::Sender<Frame>,
    driver: JoinHandle<()>,
    alerts: JoinHandle<()>,
}

impl PacedSession {
    fn abort(self) {
        self.driver.abort();
        self.alerts.abort();
    }
}

async fn spawn_paced_driver(state: &Arc<AppState>, session_id: Uuid, period: Duration) {
    let (frame_tx, frame_rx) = mpsc::channel::<Frame>(FRAME_QUEUE_DEPTH);
    let (outcome_tx, mut outcome_rx) = mpsc::channel::<TickOutcome>(FRAME_QUEUE_DEPTH);

    let driver = TickDriver::new(Arc::clone(&state.monitor), period).for_session(session_id);
    let driver = tokio::spawn(async move {
        match driver.run(frame_rx, outcome_tx).await {
            Ok(ticks) => info!("Paced driver finished after {} ticks", ticks),
            Err(err) => warn!("Paced driver failed: {}", err),
        }
    });

    let monitor = Arc::clone(&state.monitor);
    let alerts = Arc::clone(&state.alerts);
    let alerts = tokio::spawn(async move {
        while let Some(outcome) = outcome_rx.recv().await {
            let mut manager = alerts.lock().await;
            // `stop` ends the session before clearing alerts under this lock
            if monitor.session_id() != Some(session_id) {
                break;
            }
            manager.process(&outcome);
        }
    });

    let previous = state.paced.lock().await.replace(PacedSession {
        frames: frame_tx,
        driver,
        alerts,
    });
    if let Some(previous) = previous {
        previous.abort();
    }
}

/// Stop the session; stopping twice is not an error
pub async fn stop(State(state): State<Arc<AppState>>) -> Json<StopResponse> {
    if let Some(paced) = state.paced.lock().await.take() {
        paced.abort();
    }
    let final_snapshot = state.monitor.stop();
    state.alerts.lock().await.clear();

    Json(StopResponse {
        stopped: final_snapshot.is_some(),
        final_snapshot,
    })
}

/// Run one tick with the posted frame
pub async fn tick(
    State(state): State<Arc<AppState>>,
    Json(request): Json<FrameRequest>,
) -> Result<Json<TickResponse>, ApiError> {
    let outcome = state.monitor.tick(&request.readings)?;
    let notification = state.alerts.lock().await.process(&outcome);
    Ok(Json(TickResponse {
        outcome,
        notification,
    }))
}

/// Queue a frame for the paced driver
pub async fn enqueue_frame(
    State(state): State<Arc<AppState>>,
    Json(request): Json<FrameRequest>,
) -> Result<StatusCode, ApiError> {
    let paced = state.paced.lock().await;
    let paced = paced.as_ref().ok_or(ApiError::NotPaced)?;
    paced.frames.try_send(request.readings).map_err(|err| match err {
        mpsc::error::TrySendError::Full(_) => ApiError::QueueFull,
        mpsc::error::TrySendError::Closed(_) => ApiError::NotPaced,
    })?;
    Ok(StatusCode::ACCEPTED)
}

/// Current status and latest snapshot
pub async fn get_session(State(state): State<Arc<AppState>>) -> Json<SessionResponse> {
    Json(SessionResponse {
        status: state.monitor.status(),
        session_id: state.monitor.session_id(),
        config: state.monitor.config(),
        snapshot: state.monitor.snapshot(),
    })
}

/// Most recent observations, oldest first
pub async fn get_history(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HistoryQuery>,
) -> Result<Json<HistoryResponse>, ApiError> {
    let observations = state
        .monitor
        .recent_observations(params.limit)
        .ok_or(ApiError::Dms(dms::DmsError::SessionNotStarted))?;

    Ok(Json(HistoryResponse {
        count: observations.len(),
        observations,
    }))
}
