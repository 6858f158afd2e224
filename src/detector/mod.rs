//! Detector lifecycle
//!
//! ## Responsibilities
//!
//! - Model loading state (not-loaded / loaded / load-failed)
//! - Scaffold responses while no model is loaded
//! - Inference call contract: failures absorbed into the result note
//! - Raw prediction to bounding box conversion
//!
//! The detection runtime is an external collaborator behind the
//! `DetectionRuntime` seam; a build without a bundled runtime keeps serving
//! structurally valid scaffold responses.

use crate::config::ModelConfig;
use crate::frame::{self, Frame};
use crate::models::{BoundingBox, InferenceMetadata, InferenceResponse};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Instant;

/// Runtime seam for the detection model stack.
pub trait DetectionRuntime: Send + Sync {
    fn load(&self, path: &Path) -> anyhow::Result<Box<dyn LoadedModel>>;
}

/// A loaded model ready for inference.
pub trait LoadedModel: Send {
    fn infer(
        &self,
        frame: &Frame,
        confidence_threshold: f32,
        iou_threshold: f32,
    ) -> anyhow::Result<Vec<RawDetection>>;
}

/// One raw output box from the runtime, prior to conversion.
///
/// Label and confidence are optional on purpose: a box missing either field is
/// kept with defaults rather than dropped.
#[derive(Debug, Clone)]
pub struct RawDetection {
    pub label: Option<String>,
    pub confidence: Option<f32>,
    /// Corner coordinates as `[x_min, y_min, x_max, y_max]`
    pub bbox: [f32; 4],
}

/// Probe for a compiled-in detection runtime.
///
/// This build bundles no runtime; the detector operates in stub mode and
/// `load_model` reports a non-fatal failure until a runtime crate implementing
/// [`DetectionRuntime`] is linked in.
pub fn probe_runtime() -> Option<Arc<dyn DetectionRuntime>> {
    tracing::debug!("no detection runtime compiled in; detector will operate in stub mode");
    None
}

/// Outcome of attempting to load the model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelLoadOutcome {
    pub success: bool,
    pub message: String,
}

impl ModelLoadOutcome {
    fn success(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

/// Runtime details about the detection model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelStatus {
    pub loaded: bool,
    pub path: String,
    pub autoload: bool,
}

/// Model loading state, owned exclusively by the detector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DetectorState {
    NotLoaded,
    Loaded,
    LoadFailed,
}

struct Inner {
    state: DetectorState,
    model: Option<Box<dyn LoadedModel>>,
}

/// Thin wrapper around the detection runtime with lazy loading and
/// failure-absorbing inference.
pub struct Detector {
    config: ModelConfig,
    runtime: Option<Arc<dyn DetectionRuntime>>,
    inner: Mutex<Inner>,
}

impl Detector {
    pub fn new(config: ModelConfig, runtime: Option<Arc<dyn DetectionRuntime>>) -> Self {
        Self {
            config,
            runtime,
            inner: Mutex::new(Inner {
                state: DetectorState::NotLoaded,
                model: None,
            }),
        }
    }

    /// Attempt to load the model weights.
    ///
    /// Idempotent once loaded. Both a missing runtime and a load error are
    /// reportable-but-not-fatal outcomes; neither panics nor propagates.
    pub fn load_model(&self) -> ModelLoadOutcome {
        let mut inner = self.lock();

        if inner.state == DetectorState::Loaded {
            return ModelLoadOutcome::success("Model already loaded.");
        }

        let runtime = match self.runtime.as_ref() {
            Some(runtime) => runtime,
            None => {
                let message =
                    "No detection runtime bundled with this build; detector stays in stub mode.";
                tracing::warn!("{}", message);
                return ModelLoadOutcome::failure(message);
            }
        };

        match runtime.load(&self.config.path) {
            Ok(model) => {
                inner.model = Some(model);
                inner.state = DetectorState::Loaded;
                tracing::info!(path = %self.config.path_display(), "detection model loaded");
                ModelLoadOutcome::success("Model loaded successfully.")
            }
            Err(e) => {
                inner.state = DetectorState::LoadFailed;
                let message = format!("Failed to load detection model: {}", e);
                tracing::error!(path = %self.config.path_display(), error = %e, "model load failed");
                ModelLoadOutcome::failure(message)
            }
        }
    }

    /// Execute inference on the supplied frame.
    ///
    /// Always returns a structurally valid response: with no model loaded the
    /// detections are empty and the note explains why, and any runtime error
    /// during inference is recorded in the note instead of being raised. The
    /// reported duration covers only the model invocation.
    pub fn predict(&self, frame: &Frame, return_image: bool) -> InferenceResponse {
        let inner = self.lock();

        let (detections, mut note, inference_ms) = match inner.model.as_ref() {
            None => {
                tracing::debug!("returning scaffold inference response: model not loaded");
                let note = "Detection model has not been loaded; returning an empty \
                            scaffold response."
                    .to_string();
                (Vec::new(), Some(note), 0.0)
            }
            Some(model) => {
                let start = Instant::now();
                let outcome = model.infer(
                    frame,
                    self.config.confidence_threshold,
                    self.config.iou_threshold,
                );
                let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;

                match outcome {
                    Ok(raw) => (convert_detections(&raw), None, elapsed_ms),
                    Err(e) => {
                        tracing::error!(error = %e, "inference failed");
                        (Vec::new(), Some(format!("Inference failed: {}", e)), elapsed_ms)
                    }
                }
            }
        };
        drop(inner);

        let encoded_image = if return_image {
            match frame::encode_png_base64(frame) {
                Ok(encoded) => Some(encoded),
                Err(e) => {
                    tracing::error!(error = %e, "failed to encode response image");
                    note.get_or_insert_with(|| format!("Failed to encode response image: {}", e));
                    None
                }
            }
        } else {
            None
        };

        InferenceResponse {
            detections,
            metadata: InferenceMetadata {
                model_path: self.config.path_display(),
                inference_ms,
                note,
            },
            encoded_image,
        }
    }

    /// Whether a model has been successfully loaded.
    pub fn is_loaded(&self) -> bool {
        self.lock().state == DetectorState::Loaded
    }

    /// Current detector status; never triggers side effects.
    pub fn status(&self) -> ModelStatus {
        ModelStatus {
            loaded: self.is_loaded(),
            path: self.config.path_display(),
            autoload: self.config.autoload,
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Map raw runtime boxes 1:1 onto response bounding boxes.
///
/// Missing label/confidence default to `"unknown"` / `0.0`. Coordinates are
/// clamped to be non-negative and ordered so min never exceeds max.
fn convert_detections(raw: &[RawDetection]) -> Vec<BoundingBox> {
    raw.iter()
        .map(|detection| {
            let [x1, y1, x2, y2] = detection.bbox;
            let (x_min, x_max) = ordered(x1, x2);
            let (y_min, y_max) = ordered(y1, y2);

            BoundingBox {
                label: detection
                    .label
                    .clone()
                    .unwrap_or_else(|| "unknown".to_string()),
                confidence: detection.confidence.unwrap_or(0.0).clamp(0.0, 1.0),
                x_min,
                y_min,
                x_max,
                y_max,
            }
        })
        .collect()
}

fn ordered(a: f32, b: f32) -> (u32, u32) {
    let lo = a.min(b).max(0.0) as u32;
    let hi = a.max(b).max(0.0) as u32;
    (lo, hi)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CameraConfig;
    use crate::frame;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FakeRuntime {
        loads: AtomicUsize,
        fail_load: bool,
        fail_infer: bool,
        detections: Vec<RawDetection>,
    }

    impl FakeRuntime {
        fn with_detections(detections: Vec<RawDetection>) -> Self {
            Self {
                loads: AtomicUsize::new(0),
                fail_load: false,
                fail_infer: false,
                detections,
            }
        }
    }

    struct FakeModel {
        fail_infer: bool,
        detections: Vec<RawDetection>,
    }

    impl DetectionRuntime for FakeRuntime {
        fn load(&self, _path: &Path) -> anyhow::Result<Box<dyn LoadedModel>> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            if self.fail_load {
                anyhow::bail!("weights file corrupt");
            }
            Ok(Box::new(FakeModel {
                fail_infer: self.fail_infer,
                detections: self.detections.clone(),
            }))
        }
    }

    impl LoadedModel for FakeModel {
        fn infer(
            &self,
            _frame: &Frame,
            _confidence_threshold: f32,
            _iou_threshold: f32,
        ) -> anyhow::Result<Vec<RawDetection>> {
            if self.fail_infer {
                anyhow::bail!("tensor shape mismatch");
            }
            Ok(self.detections.clone())
        }
    }

    fn test_frame() -> Frame {
        frame::mock_frame(&CameraConfig {
            width: 4,
            height: 4,
            ..CameraConfig::default()
        })
    }

    #[test]
    fn test_predict_without_model_returns_scaffold() {
        let detector = Detector::new(ModelConfig::default(), None);
        let response = detector.predict(&test_frame(), false);

        assert!(response.detections.is_empty());
        let note = response.metadata.note.expect("scaffold note expected");
        assert!(!note.is_empty());
        assert!(response.encoded_image.is_none());
    }

    #[test]
    fn test_load_without_runtime_is_nonfatal() {
        let detector = Detector::new(ModelConfig::default(), None);
        let outcome = detector.load_model();

        assert!(!outcome.success);
        assert!(!outcome.message.is_empty());
        assert!(!detector.is_loaded());
    }

    #[test]
    fn test_load_failure_is_captured() {
        let runtime = FakeRuntime {
            fail_load: true,
            ..FakeRuntime::with_detections(Vec::new())
        };
        let detector = Detector::new(ModelConfig::default(), Some(Arc::new(runtime)));
        let outcome = detector.load_model();

        assert!(!outcome.success);
        assert!(outcome.message.contains("weights file corrupt"));
        assert!(!detector.is_loaded());
    }

    #[test]
    fn test_load_is_idempotent() {
        let runtime = Arc::new(FakeRuntime::with_detections(Vec::new()));
        let detector = Detector::new(ModelConfig::default(), Some(runtime.clone()));

        assert!(detector.load_model().success);
        assert!(detector.load_model().success);
        assert_eq!(runtime.loads.load(Ordering::SeqCst), 1);
        assert!(detector.is_loaded());
    }

    #[test]
    fn test_predict_converts_raw_detections() {
        let raw = vec![
            RawDetection {
                label: Some("person".to_string()),
                confidence: Some(0.92),
                bbox: [10.0, 20.0, 110.0, 220.0],
            },
            RawDetection {
                label: None,
                confidence: None,
                bbox: [50.0, -3.0, 30.0, 40.0],
            },
        ];
        let detector = Detector::new(
            ModelConfig::default(),
            Some(Arc::new(FakeRuntime::with_detections(raw))),
        );
        detector.load_model();

        let response = detector.predict(&test_frame(), false);
        assert_eq!(response.detections.len(), 2);

        let first = &response.detections[0];
        assert_eq!(first.label, "person");
        assert_eq!(first.x_min, 10);
        assert_eq!(first.y_max, 220);

        // Missing fields default instead of dropping the box, and coordinates
        // come out non-negative and ordered.
        let second = &response.detections[1];
        assert_eq!(second.label, "unknown");
        assert_eq!(second.confidence, 0.0);
        assert_eq!(second.x_min, 30);
        assert_eq!(second.x_max, 50);
        assert_eq!(second.y_min, 0);
        assert_eq!(second.y_max, 40);
    }

    #[test]
    fn test_inference_failure_absorbed_into_note() {
        let runtime = FakeRuntime {
            fail_infer: true,
            ..FakeRuntime::with_detections(Vec::new())
        };
        let detector = Detector::new(ModelConfig::default(), Some(Arc::new(runtime)));
        detector.load_model();

        let response = detector.predict(&test_frame(), false);
        assert!(response.detections.is_empty());
        let note = response.metadata.note.expect("failure note expected");
        assert!(note.contains("tensor shape mismatch"));
    }

    #[test]
    fn test_return_image_round_trips() {
        let detector = Detector::new(ModelConfig::default(), None);
        let frame = test_frame();

        let response = detector.predict(&frame, true);
        let encoded = response.encoded_image.expect("encoded image expected");
        let decoded = frame::decode_base64_image(&encoded).unwrap();
        assert_eq!(decoded, frame);
    }
}
