use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::error::PipelineError;

/// API error types returned from handlers.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal server error: {0}")]
    InternalError(String),
}

/// Error response that gets serialized to JSON.
#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_type(&self) -> &'static str {
        match self {
            ApiError::NotFound(_) => "NotFound",
            ApiError::BadRequest(_) => "BadRequest",
            ApiError::InternalError(_) => "InternalServerError",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let message = match &self {
            ApiError::InternalError(_) => {
                tracing::error!(error = %self, "API error occurred");
                "An internal error occurred".to_string()
            }
            _ => {
                tracing::debug!(error = %self, "Client error");
                self.to_string()
            }
        };

        let body = ErrorResponse {
            error: self.error_type().to_string(),
            message,
        };
        (status, Json(body)).into_response()
    }
}

/// Translate the pipeline taxonomy: missing artifacts and bad input become
/// 4xx, everything else is a 5xx.
impl From<PipelineError> for ApiError {
    fn from(error: PipelineError) -> Self {
        match error {
            PipelineError::ArtifactMissing(_) => ApiError::NotFound(error.to_string()),
            PipelineError::DataFormat(_) => ApiError::BadRequest(error.to_string()),
            PipelineError::Configuration(_)
            | PipelineError::ModelInference(_)
            | PipelineError::Io(_)
            | PipelineError::Csv(_)
            | PipelineError::Json(_) => ApiError::InternalError(error.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn status_codes() {
        assert_eq!(
            ApiError::NotFound("x".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::BadRequest("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::InternalError("x".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn pipeline_taxonomy_maps_to_http() {
        let missing: ApiError = PipelineError::ArtifactMissing(PathBuf::from("m.bin")).into();
        assert!(matches!(missing, ApiError::NotFound(_)));

        let bad: ApiError = PipelineError::data_format("unparsable").into();
        assert!(matches!(bad, ApiError::BadRequest(_)));

        let inference: ApiError = PipelineError::inference("boom").into();
        assert!(matches!(inference, ApiError::InternalError(_)));
    }
}
