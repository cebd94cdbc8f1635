//! Alert Routes

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use std::sync::Arc;

use crate::{ApiError, AppState};

/// Delivered alert awaiting acknowledgement
#[derive(Debug, Serialize)]
pub struct PendingAlert {
    pub alert_number: u64,
    pub age_seconds: u64,
}

/// Response for alerts endpoint
#[derive(Debug, Serialize)]
pub struct AlertResponse {
    pub pending: Vec<PendingAlert>,
    pub hourly_count: usize,
    pub suppressed: u64,
}

/// Get unacknowledged alerts
pub async fn get_alerts(State(state): State<Arc<AppState>>) -> Json<AlertResponse> {
    let alerts = state.alerts.lock().await;
    let pending = alerts
        .pending()
        .into_iter()
        .map(|(alert_number, alert)| PendingAlert {
            alert_number,
            age_seconds: alert.delivered_at.elapsed().as_secs(),
        })
        .collect();

    Json(AlertResponse {
        pending,
        hourly_count: alerts.hourly_count(),
        suppressed: alerts.suppressed(),
    })
}

/// Acknowledge a delivered alert
pub async fn acknowledge(
    State(state): State<Arc<AppState>>,
    Path(alert_number): Path<u64>,
) -> Result<StatusCode, ApiError> {
    if state.alerts.lock().await.acknowledge(alert_number) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::UnknownAlert(alert_number))
    }
}
