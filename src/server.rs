//! HTTP surface: prediction, schema and health endpoints

use crate::error::{AssessError, PredictorError};
use crate::metrics::ServiceMetrics;
use crate::models::inference::Predictor;
use crate::pipeline::assess;
use crate::schema::SCHEMA;
use crate::validator::RawInput;
use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Instant;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub predictor: Arc<Predictor>,
    pub metrics: Arc<ServiceMetrics>,
}

impl AppState {
    pub fn new(predictor: Arc<Predictor>, metrics: Arc<ServiceMetrics>) -> Self {
        Self { predictor, metrics }
    }
}

/// Build the application router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/predict", post(predict))
        .route("/api/schema", get(schema))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn error_response(status: StatusCode, message: &str, details: Option<Value>) -> Response {
    let body = match details {
        Some(details) => json!({ "error": message, "details": details }),
        None => json!({ "error": message }),
    };
    (status, Json(body)).into_response()
}

async fn predict(State(state): State<AppState>, body: Bytes) -> Response {
    let raw: RawInput = match serde_json::from_slice::<Value>(&body) {
        Ok(Value::Object(map)) => map,
        Ok(_) => {
            warn!("Prediction request body is not a JSON object");
            return error_response(StatusCode::BAD_REQUEST, "Malformed JSON", None);
        }
        Err(e) => {
            warn!(error = %e, "Failed to parse prediction request");
            return error_response(StatusCode::BAD_REQUEST, "Malformed JSON", None);
        }
    };

    let start_time = Instant::now();
    let predictor = state.predictor.clone();
    let outcome = tokio::task::spawn_blocking(move || assess(&predictor, &raw)).await;

    match outcome {
        Ok(Ok(assessment)) => {
            let latency = start_time.elapsed();
            state.metrics.record_prediction(
                latency,
                assessment.risk_class,
                assessment.confidence / 100.0,
            );
            info!(
                prediction_id = %assessment.prediction_id,
                risk_class = assessment.risk_class,
                confidence = assessment.confidence,
                latency_us = latency.as_micros(),
                "Prediction served"
            );
            (StatusCode::OK, Json(assessment)).into_response()
        }
        Ok(Err(AssessError::ValidationFailed(errors))) => {
            state.metrics.record_validation_failure();
            let fields: Vec<&String> = errors.keys().collect();
            warn!(fields = ?fields, "Validation failed");
            error_response(
                StatusCode::BAD_REQUEST,
                "Validation failed",
                Some(json!(errors)),
            )
        }
        Ok(Err(AssessError::Predictor(e))) => {
            state.metrics.record_failure(e.kind());
            error!(kind = e.kind(), error = %e, "Prediction failed");
            let message = match &e {
                PredictorError::ModelNotFound(_) => "Model not found",
                _ => "Prediction failed",
            };
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                message,
                Some(Value::String(e.to_string())),
            )
        }
        Err(e) => {
            state.metrics.record_failure("task_failed");
            error!(error = %e, "Prediction task failed");
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Prediction failed",
                Some(Value::String(e.to_string())),
            )
        }
    }
}

/// Ordered field descriptors the input form is built from
async fn schema() -> Json<Value> {
    Json(json!({ "fields": SCHEMA.as_slice() }))
}

async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "model_loaded": state.predictor.is_loaded(),
        "model_path": state.predictor.model_path().display().to_string(),
    }))
}
