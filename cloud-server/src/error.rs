//! Error handling

use axum::{
    response::{IntoResponse, Response},
    http::StatusCode,
    Json,
};
use serde_json::json;
use shieldsight_core::{BatchError, PredictError};

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // Prediction errors
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("service unavailable")]
    ServiceUnavailable,
    #[error("batch of {received} exceeds limit {limit}")]
    BatchLimitExceeded { received: usize, limit: usize },

    // Request body errors
    #[error("validation failed: {0}")]
    ValidationError(String),
}

impl AppError {
    fn code(&self) -> &'static str {
        match self {
            AppError::InvalidInput(_) => "InvalidInput",
            AppError::ServiceUnavailable => "ServiceUnavailable",
            AppError::BatchLimitExceeded { .. } => "BatchLimitExceeded",
            AppError::ValidationError(_) => "ValidationError",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::ServiceUnavailable => (
                StatusCode::SERVICE_UNAVAILABLE,
                "Service temporarily unavailable".to_string(),
            ),
            AppError::BatchLimitExceeded { received, limit } => (
                StatusCode::BAD_REQUEST,
                format!("Maximum {} URLs per batch, received {}", limit, received),
            ),
            AppError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
        };

        let body = Json(json!({
            "error": self.code(),
            "message": message,
            "status": status.as_u16()
        }));

        (status, body).into_response()
    }
}

impl From<PredictError> for AppError {
    fn from(err: PredictError) -> Self {
        match err {
            PredictError::InvalidInput(msg) => AppError::InvalidInput(msg),
            PredictError::ServiceUnavailable => AppError::ServiceUnavailable,
        }
    }
}

impl From<BatchError> for AppError {
    fn from(err: BatchError) -> Self {
        match err {
            BatchError::TooLarge { received, limit } => AppError::BatchLimitExceeded { received, limit },
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::ValidationError(err.to_string())
    }
}
