//! Prediction endpoint
//!
//! `POST /api/predict` and its `/predict` alias run one request through the
//! pipeline. Failures are recorded for `/health` before being returned.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use tracing::{error, warn};

use crate::error::{ApiError, ApiResult};
use crate::models::{PredictRequest, PredictResponse};
use crate::AppState;

/// POST /api/predict
pub async fn predict(
    State(state): State<AppState>,
    payload: Result<Json<PredictRequest>, JsonRejection>,
) -> ApiResult<Json<PredictResponse>> {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE => {
            warn!(error = %rejection.body_text(), "Rejected oversized request body");
            return Err(ApiError::PayloadTooLarge(rejection.body_text()));
        }
        Err(rejection) => {
            warn!(error = %rejection.body_text(), "Rejected unreadable request body");
            return Err(ApiError::MissingInput(rejection.body_text()));
        }
    };

    let Some(data) = request.data else {
        return Err(ApiError::MissingInput("request has no `data` field".to_string()));
    };

    match state.pipeline.predict(data).await {
        Ok(result) => Ok(Json(PredictResponse::from(&result))),
        Err(e) => {
            error!(error = %e, "Prediction failed");
            state.record_error(e.to_string()).await;
            Err(e.into())
        }
    }
}

/// Build prediction routes
pub fn predict_routes() -> Router<AppState> {
    Router::new()
        .route("/api/predict", post(predict))
        .route("/predict", post(predict))
}
