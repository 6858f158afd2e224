//! API Routes

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};

use crate::error::{Error, Result};
use crate::models::{InferenceRequest, InferenceResponse, ModelLoadResponse};
use crate::state::AppState;

/// Create API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(super::health_check))
        .route("/model/load", post(load_model))
        .route("/inference", post(run_inference))
        .with_state(state)
}

/// Trigger model loading and report the outcome.
///
/// Loading is blocking (weights read from disk), so it runs off the event
/// loop. The outcome is always a 200 response; a failed load is reportable,
/// not an HTTP error.
async fn load_model(State(state): State<AppState>) -> Result<Json<ModelLoadResponse>> {
    let detector = state.detector.clone();
    let outcome = tokio::task::spawn_blocking(move || detector.load_model())
        .await
        .map_err(|e| Error::Internal(format!("model load task failed: {}", e)))?;

    Ok(Json(ModelLoadResponse {
        success: outcome.success,
        message: outcome.message,
    }))
}

/// Execute inference using either a captured or a provided frame.
async fn run_inference(
    State(state): State<AppState>,
    Json(request): Json<InferenceRequest>,
) -> Result<Json<InferenceResponse>> {
    let response = state.orchestrator.run_inference(request).await?;
    Ok(Json(response))
}
