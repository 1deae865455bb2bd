//! Shared application state and request/response types for the HTTP API.

use std::sync::Arc;

use serde::Serialize;

use crate::domain::CropYields;
use crate::models::YieldPredictor;

/// Shared state handed to every handler.
///
/// Cloning is cheap: only the `Arc` is cloned, every clone sees the same model.
#[derive(Clone)]
pub struct AppState {
    pub model: Arc<dyn YieldPredictor>,
}

impl AppState {
    pub fn new(model: Arc<dyn YieldPredictor>) -> Self {
        Self { model }
    }
}

/// Body of a successful `POST /api/predict`.
#[derive(Debug, Serialize)]
pub struct PredictResponse {
    pub predictions: CropYields,
    pub accuracy: f64,
    pub status: &'static str,
}

/// Body of every failed request.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self { error: error.into() }
    }
}

/// Body of `GET /api/health`.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub model_loaded: bool,
}
