//! Inference orchestration
//!
//! ## Responsibilities
//!
//! - Per-request frame source selection (camera capture vs uploaded payload)
//! - Fail-fast validation of client payloads before touching hardware
//! - Startup and shutdown sequencing for the lifecycle components
//!
//! Camera capture and model invocation are blocking operations and run on the
//! blocking thread pool, keeping the event loop free.

use crate::camera::CameraController;
use crate::config::AppConfig;
use crate::detector::Detector;
use crate::error::{Error, Result};
use crate::frame;
use crate::models::{InferenceRequest, InferenceResponse};
use std::sync::Arc;

/// Coordinates the camera and detector for the HTTP surface.
///
/// All collaborators are injected at construction; the orchestrator owns no
/// mutable state of its own.
pub struct Orchestrator {
    config: Arc<AppConfig>,
    camera: Arc<CameraController>,
    detector: Arc<Detector>,
}

impl Orchestrator {
    pub fn new(
        config: Arc<AppConfig>,
        camera: Arc<CameraController>,
        detector: Arc<Detector>,
    ) -> Self {
        Self {
            config,
            camera,
            detector,
        }
    }

    /// Execute inference using either a captured or an uploaded frame.
    ///
    /// A missing payload when not capturing is rejected before camera or
    /// detector are involved; an undecodable payload is rejected before the
    /// detector is involved. Both are client input errors.
    pub async fn run_inference(&self, request: InferenceRequest) -> Result<InferenceResponse> {
        let detector = self.detector.clone();
        let return_image = request.return_image;

        if request.capture_from_camera {
            let camera = self.camera.clone();
            spawn_blocking(move || {
                let frame = camera.capture_frame()?;
                Ok(detector.predict(&frame, return_image))
            })
            .await?
        } else {
            let payload = request
                .image_base64
                .as_deref()
                .filter(|payload| !payload.is_empty())
                .ok_or(Error::MissingImagePayload)?;
            let frame = frame::decode_base64_image(payload)?;

            spawn_blocking(move || Ok(detector.predict(&frame, return_image))).await?
        }
    }

    /// Startup sequencing, invoked once before serving.
    ///
    /// Camera autostart and model autoload are independent: both are always
    /// attempted, and only a camera failure with fallback disabled is fatal.
    pub async fn startup(&self) -> Result<()> {
        let mut camera_result = Ok(());

        if self.config.autostart_camera {
            tracing::info!("autostarting camera controller");
            let camera = self.camera.clone();
            camera_result = spawn_blocking(move || camera.initialize()).await?;
        }

        if self.config.model.autoload {
            tracing::info!(path = %self.config.model.path_display(), "autoloading detection model");
            let detector = self.detector.clone();
            let outcome = spawn_blocking(move || Ok(detector.load_model())).await??;
            if !outcome.success {
                tracing::warn!(
                    message = %outcome.message,
                    "model autoload failed; continuing in scaffold mode"
                );
            }
        }

        camera_result
    }

    /// Shutdown sequencing, invoked once at service stop.
    ///
    /// The camera is always shut down; the detector needs no teardown.
    pub async fn shutdown(&self) {
        let camera = self.camera.clone();
        if let Err(e) = tokio::task::spawn_blocking(move || camera.shutdown()).await {
            tracing::warn!(error = %e, "camera shutdown task failed");
        }
    }
}

async fn spawn_blocking<T>(task: impl FnOnce() -> Result<T> + Send + 'static) -> Result<Result<T>>
where
    T: Send + 'static,
{
    tokio::task::spawn_blocking(task)
        .await
        .map_err(|e| Error::Internal(format!("blocking task failed: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CameraConfig, MockFrameColor};

    fn mock_setup(autostart: bool, autoload: bool) -> Orchestrator {
        let mut config = AppConfig::default();
        config.autostart_camera = autostart;
        config.camera = CameraConfig {
            width: 4,
            height: 3,
            use_mock: true,
            mock_frame_color: MockFrameColor::Gray,
            ..CameraConfig::default()
        };
        config.model.autoload = autoload;
        let config = Arc::new(config);

        let camera = Arc::new(CameraController::new(config.camera.clone(), None));
        let detector = Arc::new(Detector::new(config.model.clone(), None));
        Orchestrator::new(config, camera, detector)
    }

    #[tokio::test]
    async fn test_missing_payload_fails_fast() {
        let orchestrator = mock_setup(false, false);
        let request = InferenceRequest {
            capture_from_camera: false,
            image_base64: None,
            return_image: false,
        };

        let err = orchestrator.run_inference(request).await.unwrap_err();
        assert!(matches!(err, Error::MissingImagePayload));
        // The camera was never touched, so it is still uninitialized.
        assert!(!orchestrator.camera.status().available);
    }

    #[tokio::test]
    async fn test_empty_payload_counts_as_missing() {
        let orchestrator = mock_setup(false, false);
        let request = InferenceRequest {
            capture_from_camera: false,
            image_base64: Some(String::new()),
            return_image: false,
        };

        let err = orchestrator.run_inference(request).await.unwrap_err();
        assert!(matches!(err, Error::MissingImagePayload));
    }

    #[tokio::test]
    async fn test_invalid_payload_is_rejected() {
        let orchestrator = mock_setup(false, false);
        let request = InferenceRequest {
            capture_from_camera: false,
            image_base64: Some("not-base64".to_string()),
            return_image: false,
        };

        let err = orchestrator.run_inference(request).await.unwrap_err();
        assert!(matches!(err, Error::InvalidImagePayload(_)));
    }

    #[tokio::test]
    async fn test_uploaded_payload_reaches_detector() {
        let orchestrator = mock_setup(false, false);
        let frame = frame::mock_frame(&CameraConfig {
            width: 4,
            height: 3,
            ..CameraConfig::default()
        });
        let payload = frame::encode_png_base64(&frame).unwrap();
        let request = InferenceRequest {
            capture_from_camera: false,
            image_base64: Some(payload),
            return_image: true,
        };

        let response = orchestrator.run_inference(request).await.unwrap();
        assert!(response.detections.is_empty());
        assert!(response.metadata.note.is_some());

        // The uploaded frame comes back pixel-identical.
        let encoded = response.encoded_image.unwrap();
        let round_tripped = frame::decode_base64_image(&encoded).unwrap();
        assert_eq!(round_tripped, frame);
    }

    #[tokio::test]
    async fn test_capture_path_uses_mock_camera() {
        let orchestrator = mock_setup(false, false);
        let request = InferenceRequest {
            capture_from_camera: true,
            image_base64: None,
            return_image: true,
        };

        let response = orchestrator.run_inference(request).await.unwrap();
        let encoded = response.encoded_image.unwrap();
        let captured = frame::decode_base64_image(&encoded).unwrap();
        assert_eq!(captured.width(), 4);
        assert_eq!(captured.height(), 3);
        assert!(captured.pixels().all(|p| p.0 == [127, 127, 127]));
    }

    #[tokio::test]
    async fn test_startup_attempts_both_components() {
        let orchestrator = mock_setup(true, true);
        // Autoload fails (no runtime) but must not prevent startup.
        orchestrator.startup().await.unwrap();

        let status = orchestrator.camera.status();
        assert!(status.available);
        assert!(status.using_mock);
        assert!(!orchestrator.detector.is_loaded());
    }

    #[tokio::test]
    async fn test_shutdown_stops_camera() {
        let orchestrator = mock_setup(true, false);
        orchestrator.startup().await.unwrap();
        orchestrator.shutdown().await;

        assert!(!orchestrator.camera.status().available);
        let err = orchestrator.camera.capture_frame().unwrap_err();
        assert!(matches!(err, Error::CameraUnavailable(_)));
    }
}
