//! HTTP surface for the yield model.
//!
//! Routes:
//! - `POST /api/predict`
//! - `GET  /api/health`
//!
//! CORS is open to every origin. Each request runs in its own task and a panic
//! inside a handler is turned into a 500 for that request only.

use std::net::SocketAddr;

use axum::Router;
use axum::routing::{get, post};
use tokio::net::TcpListener;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::error::{AppError, EXIT_SERVER};

pub mod handlers;
pub mod state;

pub use state::AppState;

/// Build the API router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/predict", post(handlers::predict_handler))
        .route("/api/health", get(handlers::health_handler))
        .layer(CatchPanicLayer::new())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind `addr` and serve until Ctrl-C.
pub async fn serve(addr: SocketAddr, state: AppState) -> Result<(), AppError> {
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| AppError::new(EXIT_SERVER, format!("Failed to bind {addr}: {e}")))?;

    info!("crop-yield API listening on http://{addr}");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| AppError::new(EXIT_SERVER, format!("Server error: {e}")))
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutdown requested");
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode, header};
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use super::*;
    use crate::domain::{CropYields, PredictionRequest, PredictionResult, TrainConfig};
    use crate::error::ModelError;
    use crate::models::{YieldModel, YieldPredictor};
    use crate::test_support::{SAMPLE_CSV, write_csv};

    /// Always fails with the given error.
    struct FailingModel(ModelError);

    impl YieldPredictor for FailingModel {
        fn predict(&self, _request: &PredictionRequest) -> Result<PredictionResult, ModelError> {
            Err(self.0.clone())
        }

        fn is_ready(&self) -> bool {
            true
        }
    }

    /// Echoes fixed yields so routing can be tested without a fitted forest.
    struct FixedModel;

    impl YieldPredictor for FixedModel {
        fn predict(&self, _request: &PredictionRequest) -> Result<PredictionResult, ModelError> {
            Ok(PredictionResult {
                predictions: CropYields::from_array([1.25, 2.5, -3.0, 0.0]),
                accuracy: 95.0,
            })
        }

        fn is_ready(&self) -> bool {
            true
        }
    }

    fn trained_model() -> Arc<YieldModel> {
        let file = write_csv(SAMPLE_CSV);
        let mut config = TrainConfig::new(file.path());
        config.forest.n_estimators = 20;
        let model = Arc::new(YieldModel::new());
        model.train(&config).unwrap();
        model
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn post_json(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/predict")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get_health() -> Request<Body> {
        Request::builder().uri("/api/health").body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn predict_returns_four_crops_and_accuracy() {
        let app = router(AppState::new(trained_model()));
        let body = json!({"country": "USA", "timeSlice": "2050", "co2Effects": "With CO2", "adaptation": "None"});
        let (status, json) = send(app, post_json(&body.to_string())).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "success");
        let predictions = json["predictions"].as_object().unwrap();
        let mut keys: Vec<&str> = predictions.keys().map(String::as_str).collect();
        keys.sort();
        assert_eq!(keys, ["coarse grains", "protein feed", "rice", "wheat"]);
        assert!(predictions.values().all(Value::is_f64));

        let accuracy = json["accuracy"].as_f64().unwrap();
        assert!((92.5..97.5).contains(&accuracy));
    }

    #[tokio::test]
    async fn predict_with_missing_fields_is_400() {
        let app = router(AppState::new(Arc::new(FixedModel)));
        let (status, json) = send(app, post_json(r#"{"country": "USA"}"#)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json, json!({"error": "Missing required parameters"}));
    }

    #[tokio::test]
    async fn predict_with_empty_or_non_string_fields_is_400() {
        for body in [
            r#"{"country": "", "timeSlice": "2050", "co2Effects": "With CO2", "adaptation": "None"}"#,
            r#"{"country": "USA", "timeSlice": 2050, "co2Effects": "With CO2", "adaptation": "None"}"#,
            r#"{"country": "USA", "timeSlice": "2050", "co2Effects": null, "adaptation": "None"}"#,
        ] {
            let app = router(AppState::new(Arc::new(FixedModel)));
            let (status, json) = send(app, post_json(body)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
            assert_eq!(json["error"], "Missing required parameters");
        }
    }

    #[tokio::test]
    async fn whitespace_only_field_is_an_unknown_category() {
        let app = router(AppState::new(trained_model()));
        let body = json!({"country": " ", "timeSlice": "2050", "co2Effects": "With CO2", "adaptation": "None"});
        let (status, json) = send(app, post_json(&body.to_string())).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "success");
        assert_eq!(json["predictions"].as_object().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn malformed_json_is_400() {
        for body in ["{not json", "[1, 2, 3]"] {
            let app = router(AppState::new(Arc::new(FixedModel)));
            let (status, json) = send(app, post_json(body)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(json["error"], "Invalid JSON body");
        }
    }

    #[tokio::test]
    async fn predict_before_training_is_503() {
        let app = router(AppState::new(Arc::new(YieldModel::new())));
        let body = json!({"country": "USA", "timeSlice": "2050", "co2Effects": "With CO2", "adaptation": "None"});
        let (status, json) = send(app, post_json(&body.to_string())).await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(json, json!({"error": "Model not loaded"}));
    }

    #[tokio::test]
    async fn prediction_failure_is_500_with_message() {
        let model = FailingModel(ModelError::Prediction("Non-finite prediction for Wheat.".to_string()));
        let app = router(AppState::new(Arc::new(model)));
        let body = json!({"country": "USA", "timeSlice": "2050", "co2Effects": "With CO2", "adaptation": "None"});
        let (status, json) = send(app, post_json(&body.to_string())).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json, json!({"error": "Non-finite prediction for Wheat."}));
    }

    #[tokio::test]
    async fn fixed_model_response_shape() {
        let app = router(AppState::new(Arc::new(FixedModel)));
        let body = json!({"country": "X", "timeSlice": "Y", "co2Effects": "Z", "adaptation": "W"});
        let (status, json) = send(app, post_json(&body.to_string())).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            json,
            json!({
                "predictions": {"wheat": 1.25, "rice": 2.5, "coarse grains": -3.0, "protein feed": 0.0},
                "accuracy": 95.0,
                "status": "success"
            })
        );
    }

    #[tokio::test]
    async fn health_reports_model_state() {
        let model = Arc::new(YieldModel::new());
        let app = router(AppState::new(model.clone()));
        let (status, json) = send(app.clone(), get_health()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json, json!({"status": "healthy", "model_loaded": false}));

        let file = write_csv(SAMPLE_CSV);
        let mut config = TrainConfig::new(file.path());
        config.forest.n_estimators = 10;
        model.train(&config).unwrap();

        let (_, json) = send(app, get_health()).await;
        assert_eq!(json, json!({"status": "healthy", "model_loaded": true}));
    }
}
