//! Shared API models
//!
//! Request and response payloads for the HTTP surface. Component status
//! snapshots live with their owning modules (`camera::CameraStatus`,
//! `detector::ModelStatus`); this module only holds the wire types built from
//! them.

use crate::camera::CameraStatus;
use crate::detector::ModelStatus;
use serde::{Deserialize, Serialize};

/// One detected object with its bounding box.
///
/// Coordinates are pixel positions with `x_min <= x_max` and `y_min <= y_max`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoundingBox {
    pub label: String,
    pub confidence: f32,
    pub x_min: u32,
    pub y_min: u32,
    pub x_max: u32,
    pub y_max: u32,
}

/// Metadata collected during inference
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InferenceMetadata {
    pub model_path: String,
    /// Wall-clock duration of the model invocation only
    pub inference_ms: f64,
    /// Explanation for degraded or scaffold behaviour
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Response payload returned by the inference endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InferenceResponse {
    /// Detections in model output order, never re-sorted
    pub detections: Vec<BoundingBox>,
    pub metadata: InferenceMetadata,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encoded_image: Option<String>,
}

/// Request body for invoking inference
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InferenceRequest {
    /// Capture a fresh frame from the camera; when false an `image_base64`
    /// payload must be provided
    #[serde(default = "default_capture_from_camera")]
    pub capture_from_camera: bool,
    #[serde(default)]
    pub image_base64: Option<String>,
    /// Include the processed frame as base64 PNG in the response
    #[serde(default)]
    pub return_image: bool,
}

fn default_capture_from_camera() -> bool {
    true
}

/// Response for manual model loading requests
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelLoadResponse {
    pub success: bool,
    pub message: String,
}

/// Response returned by the health endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// `"ok"` or `"degraded"`
    pub status: String,
    pub camera: CameraStatus,
    pub model: ModelStatus,
}
