//! Edge Inference Endpoint
//!
//! Single-device HTTP service that captures a frame (hardware camera, mock
//! fallback, or uploaded payload) and runs it through an object-detection
//! model.
//!
//! ## Architecture
//!
//! 1. CameraController - hardware acquisition, mock degradation, idempotent shutdown
//! 2. Detector - model loading state, scaffold responses, failure-absorbing inference
//! 3. Orchestrator - per-request frame source selection, startup/shutdown sequencing
//! 4. Health - aggregate verdict from camera and detector snapshots
//! 5. WebAPI - REST endpoints (`/healthz`, `/model/load`, `/inference`)
//!
//! ## Design Principles
//!
//! - Each lifecycle state (camera, detector) has exactly one owning component
//! - External stacks (capture driver, detection runtime) sit behind traits,
//!   selected by availability probe at startup
//! - Hardware and model faults degrade the service descriptively; only client
//!   input errors fail requests

pub mod camera;
pub mod config;
pub mod detector;
pub mod error;
pub mod frame;
pub mod health;
pub mod models;
pub mod orchestrator;
pub mod state;
pub mod web_api;

pub use error::{Error, Result};
pub use state::AppState;
