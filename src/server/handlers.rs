//! REST API handlers.

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::Value;
use tracing::{debug, error, warn};

use crate::domain::PredictionRequest;
use crate::error::ModelError;
use crate::server::state::{AppState, ErrorResponse, HealthResponse, PredictResponse};

const MISSING_PARAMETERS: &str = "Missing required parameters";

/// POST `/api/predict` - Predicts yields for one scenario.
///
/// # Request Body
/// ```json
/// {
///   "country": "USA",
///   "timeSlice": "2050",
///   "co2Effects": "With CO2",
///   "adaptation": "None"
/// }
/// ```
///
/// # Response
/// - `200 OK` with predictions, accuracy and `"status": "success"`
/// - `400 BAD_REQUEST` if the body is not a JSON object or a field is missing/empty
/// - `503 SERVICE_UNAVAILABLE` if no model has been trained yet
/// - `500 INTERNAL_SERVER_ERROR` with the underlying message if inference fails
pub async fn predict_handler(State(state): State<AppState>, body: Result<Json<Value>, JsonRejection>) -> Response {
    let body = match body {
        Ok(Json(body)) if body.is_object() => body,
        Ok(_) => return error_response(StatusCode::BAD_REQUEST, "Invalid JSON body"),
        Err(rejection) => {
            warn!("rejected predict body: {rejection}");
            return error_response(StatusCode::BAD_REQUEST, "Invalid JSON body");
        }
    };

    let (Some(country), Some(time_slice), Some(co2_effects), Some(adaptation)) = (
        string_field(&body, "country"),
        string_field(&body, "timeSlice"),
        string_field(&body, "co2Effects"),
        string_field(&body, "adaptation"),
    ) else {
        return error_response(StatusCode::BAD_REQUEST, MISSING_PARAMETERS);
    };

    let request = match PredictionRequest::new(country, time_slice, co2_effects, adaptation) {
        Ok(request) => request,
        Err(err) => return model_error_response(&err),
    };
    debug!(?request, "predict request");

    // Forest inference is CPU-bound; keep it off the async workers.
    let model = state.model.clone();
    let outcome = match tokio::task::spawn_blocking(move || model.predict(&request)).await {
        Ok(outcome) => outcome,
        Err(join_err) => {
            error!("prediction task failed: {join_err}");
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to make prediction");
        }
    };

    match outcome {
        Ok(result) => (
            StatusCode::OK,
            Json(PredictResponse {
                predictions: result.predictions,
                accuracy: result.accuracy,
                status: "success",
            }),
        )
            .into_response(),
        Err(err) => model_error_response(&err),
    }
}

/// GET `/api/health` - Liveness plus whether a model is installed.
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        model_loaded: state.model.is_ready(),
    })
}

/// Non-empty string value of `key`, if present.
fn string_field(body: &Value, key: &str) -> Option<String> {
    body.get(key)?
        .as_str()
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn model_error_response(err: &ModelError) -> Response {
    match err {
        ModelError::Validation(_) => error_response(StatusCode::BAD_REQUEST, MISSING_PARAMETERS),
        ModelError::NotReady => {
            error!("prediction requested before the model was trained");
            error_response(StatusCode::SERVICE_UNAVAILABLE, err.to_string())
        }
        ModelError::Prediction(message) => {
            error!("prediction failed: {message}");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, message.clone())
        }
        ModelError::DataLoad { .. } | ModelError::Fit(_) => {
            error!("unexpected model error during prediction: {err}");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to make prediction")
        }
    }
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(ErrorResponse::new(message))).into_response()
}
