//! WebAPI - REST endpoints
//!
//! ## Responsibilities
//!
//! - HTTP route registration
//! - Request validation delegation to the orchestrator
//! - Response formatting

mod routes;

pub use routes::create_router;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;

use crate::health;
use crate::state::AppState;

/// Health check endpoint: aggregate verdict from camera and detector status.
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let camera = state.camera.status();
    let model = state.detector.status();
    Json(health::evaluate(camera, model))
}
