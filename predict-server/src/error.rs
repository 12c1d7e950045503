//! Error handling

use axum::{
    response::{IntoResponse, Response},
    http::StatusCode,
    Json,
};
use penalty_core::{ErrorEnvelope, ServiceError};
use thiserror::Error;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    // Request errors (empty, malformed, missing column, invalid value)
    #[error("{0}")]
    BadRequest(String),

    // No usable model behind the handle
    #[error("{0}")]
    ModelUnavailable(String),

    // Provider failed while scoring
    #[error("{0}")]
    InferenceError(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::ModelUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::InferenceError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error_message = match &self {
            AppError::BadRequest(msg) => msg.clone(),
            AppError::ModelUnavailable(msg) => {
                tracing::warn!("Model unavailable: {}", msg);
                msg.clone()
            }
            AppError::InferenceError(msg) => {
                tracing::error!("Inference error: {}", msg);
                msg.clone()
            }
        };

        (status, Json(ErrorEnvelope::new(error_message))).into_response()
    }
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        let message = err.to_string();
        match err {
            ServiceError::EmptyInput | ServiceError::Decode(_) | ServiceError::Validation(_) => {
                AppError::BadRequest(message)
            }
            ServiceError::ModelUnavailable(_) => AppError::ModelUnavailable(message),
            ServiceError::Inference(_) => AppError::InferenceError(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_error_status_mapping() {
        assert_eq!(AppError::from(ServiceError::EmptyInput).status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::from(ServiceError::Decode("x".into())).status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            AppError::from(ServiceError::ModelUnavailable("x".into())).status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            AppError::from(ServiceError::Inference("x".into())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_message_is_preserved() {
        let err = AppError::from(ServiceError::EmptyInput);
        assert_eq!(err.to_string(), "No input data provided");
    }
}
