//! HTTP error mapping

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use dms::DmsError;
use serde::Serialize;
use thiserror::Error;

/// Errors returned by handlers
#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Dms(#[from] DmsError),

    #[error("Session was not started in paced mode")]
    NotPaced,

    #[error("Frame queue is full")]
    QueueFull,

    #[error("Unknown alert: {0}")]
    UnknownAlert(u64),
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Dms(DmsError::InvalidConfig(_)) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Dms(DmsError::SessionNotStarted)
            | ApiError::Dms(DmsError::SessionAlreadyStarted)
            | ApiError::NotPaced => StatusCode::CONFLICT,
            ApiError::Dms(DmsError::ReentrantTick) => StatusCode::TOO_MANY_REQUESTS,
            ApiError::QueueFull => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::UnknownAlert(_) => StatusCode::NOT_FOUND,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.to_string(),
        };
        (self.status(), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use data_validator::ValidationError;

    #[test]
    fn test_status_mapping() {
        let invalid = DmsError::InvalidConfig(ValidationError::NotPositive {
            field: "history_size",
        });
        assert_eq!(ApiError::from(invalid).status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(ApiError::from(DmsError::SessionNotStarted).status(), StatusCode::CONFLICT);
        assert_eq!(ApiError::from(DmsError::SessionAlreadyStarted).status(), StatusCode::CONFLICT);
        assert_eq!(ApiError::from(DmsError::ReentrantTick).status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(ApiError::UnknownAlert(3).status(), StatusCode::NOT_FOUND);
    }
}
