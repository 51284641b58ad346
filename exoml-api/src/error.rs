//! Error types for exoml-api
//!
//! Every failure reaches the client as `{"error": <cause>, "message": <summary>}`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::services::PipelineError;

/// Summary for a missing or unreadable request body
pub const MISSING_INPUT_MESSAGE: &str = "No CSV data provided";

/// Summary for a body over the configured limit
pub const PAYLOAD_TOO_LARGE_MESSAGE: &str = "Request body too large";

/// Summary for any pipeline failure
pub const PREDICTION_FAILED_MESSAGE: &str = "Error processing prediction";

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Body absent, not JSON, or without a `data` string (400)
    #[error("{0}")]
    MissingInput(String),

    /// Body over the router's limit (413)
    #[error("{0}")]
    PayloadTooLarge(String),

    /// Pipeline failure (500, or 503 on a stage deadline)
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::MissingInput(_) => StatusCode::BAD_REQUEST,
            ApiError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Pipeline(PipelineError::Timeout { .. }) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Pipeline(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            ApiError::MissingInput(detail) => json!({
                "error": MISSING_INPUT_MESSAGE,
                "message": detail,
            }),
            ApiError::PayloadTooLarge(detail) => json!({
                "error": PAYLOAD_TOO_LARGE_MESSAGE,
                "message": detail,
            }),
            ApiError::Pipeline(err) => json!({
                "error": err.to_string(),
                "message": PREDICTION_FAILED_MESSAGE,
            }),
        };

        (status, Json(body)).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
