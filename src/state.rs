//! Application state
//!
//! Holds the shared long-lived components. Everything is constructed once in
//! `main` and injected here; handlers never reach for ambient globals.

use crate::camera::{CameraController, CaptureDriver};
use crate::config::AppConfig;
use crate::detector::{DetectionRuntime, Detector};
use crate::orchestrator::Orchestrator;
use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub camera: Arc<CameraController>,
    pub detector: Arc<Detector>,
    pub orchestrator: Arc<Orchestrator>,
}

impl AppState {
    /// Wire up the component graph from a loaded configuration.
    pub fn new(
        config: AppConfig,
        driver: Option<Box<dyn CaptureDriver>>,
        runtime: Option<Arc<dyn DetectionRuntime>>,
    ) -> Self {
        let config = Arc::new(config);
        let camera = Arc::new(CameraController::new(config.camera.clone(), driver));
        let detector = Arc::new(Detector::new(config.model.clone(), runtime));
        let orchestrator = Arc::new(Orchestrator::new(
            config.clone(),
            camera.clone(),
            detector.clone(),
        ));

        Self {
            config,
            camera,
            detector,
            orchestrator,
        }
    }
}
