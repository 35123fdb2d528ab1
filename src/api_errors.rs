use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::errors::ServiceError;

/// Error returned by HTTP handlers. Every variant serializes to a JSON body
/// carrying a stable `error` kind.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    InvalidInput(String),
    /// Body over the configured limit; reported as invalid input with 413
    #[error("{0}")]
    PayloadTooLarge(String),
    #[error("{0}")]
    ModelUnavailable(String),
    #[error("{0}")]
    Internal(String),
}

impl AppError {
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn payload_too_large(msg: impl Into<String>) -> Self {
        Self::PayloadTooLarge(msg.into())
    }

    pub fn model_unavailable(msg: impl Into<String>) -> Self {
        Self::ModelUnavailable(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Machine-readable kind reported in the `error` field
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::InvalidInput(_) | AppError::PayloadTooLarge(_) => "invalid_input",
            AppError::ModelUnavailable(_) => "model_unavailable",
            AppError::Internal(_) => "internal_error",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::ModelUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn body(&self) -> ErrorBody {
        ErrorBody {
            error: self.kind().to_string(),
            message: self.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (self.status(), Json(self.body())).into_response()
    }
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::InvalidInput { .. } => AppError::InvalidInput(err.to_string()),
            ServiceError::ModelUnavailable { message } => AppError::ModelUnavailable(message),
            ServiceError::Internal { message } => AppError::Internal(message),
            // Artifact failures never reach a request in a healthy process;
            // if they do, the caller cannot fix them.
            other => AppError::Internal(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ArtifactKind;

    #[test]
    fn kinds_map_to_status_codes() {
        assert_eq!(AppError::invalid_input("x").status(), StatusCode::BAD_REQUEST);
        let too_large = AppError::payload_too_large("x");
        assert_eq!(too_large.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(too_large.kind(), "invalid_input");
        assert_eq!(
            AppError::model_unavailable("x").status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            AppError::internal("x").status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn service_errors_are_classified() {
        let err: AppError = ServiceError::invalid_input("review", "missing").into();
        assert_eq!(err.kind(), "invalid_input");

        let err: AppError = ServiceError::model_unavailable("not loaded").into();
        assert_eq!(err.kind(), "model_unavailable");
        assert_eq!(err.body().message, "not loaded");

        let err: AppError = ServiceError::artifact_shape(ArtifactKind::Vectorizer, "empty").into();
        assert_eq!(err.kind(), "internal_error");
    }
}
