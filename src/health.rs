//! Health aggregation
//!
//! Derives a single service verdict from the camera and detector snapshots.
//! Health is coupled to configured expectations: an unloaded model only
//! degrades the verdict when autoload was requested.

use crate::camera::CameraStatus;
use crate::detector::ModelStatus;
use crate::models::HealthResponse;

/// Evaluate the aggregate service health.
///
/// `"degraded"` when the camera is unavailable, or when the model was
/// configured to autoload but is not loaded; `"ok"` otherwise.
pub fn evaluate(camera: CameraStatus, model: ModelStatus) -> HealthResponse {
    let degraded = !camera.available || (model.autoload && !model.loaded);
    let status = if degraded { "degraded" } else { "ok" };

    HealthResponse {
        status: status.to_string(),
        camera,
        model,
    }
}
