//! Camera lifecycle
//!
//! ## Responsibilities
//!
//! - Hardware acquisition through the `CaptureDriver` seam
//! - Graceful degradation to synthetic mock frames
//! - Lazy start on first capture, idempotent initialize/shutdown
//! - Status snapshots for the health endpoint
//!
//! The hardware stack is an external collaborator: the controller is handed an
//! optional driver at construction (capability probe in `probe_driver`), never
//! a conditional import buried in the capture path.

use crate::config::CameraConfig;
use crate::error::{Error, Result};
use crate::frame::{self, Frame};
use serde::{Deserialize, Serialize};
use std::sync::Mutex;

/// Driver seam for the physical capture stack.
///
/// `acquire` is expected to open the device, apply the configured resolution
/// and start capture, returning a live session.
pub trait CaptureDriver: Send + Sync {
    fn acquire(&self, config: &CameraConfig) -> anyhow::Result<Box<dyn CaptureSession>>;
}

/// A started capture session handed out by a driver.
pub trait CaptureSession: Send {
    /// Read the latest frame from the device.
    fn read_frame(&mut self) -> anyhow::Result<Frame>;

    /// Stop capture and release the device.
    fn stop(&mut self) -> anyhow::Result<()>;
}

/// Probe for a compiled-in hardware capture driver.
///
/// This build bundles no hardware stack; on devices with a camera the binary
/// is linked against a board-specific driver crate that implements
/// [`CaptureDriver`] and is returned here.
pub fn probe_driver() -> Option<Box<dyn CaptureDriver>> {
    tracing::debug!("no hardware capture driver compiled in");
    None
}

/// Camera lifecycle state, owned exclusively by the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CameraState {
    Uninitialized,
    MockActive,
    HardwareActive,
    ShutDown,
}

/// Runtime details about the camera controller
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CameraStatus {
    pub available: bool,
    pub using_mock: bool,
    pub width: u32,
    pub height: u32,
    pub fps: u32,
}

struct Inner {
    state: CameraState,
    session: Option<Box<dyn CaptureSession>>,
}

/// Controller for the capture hardware and its mock fallback.
///
/// Operations are blocking (hardware start includes the warmup sleep) and are
/// expected to be dispatched via `spawn_blocking` by async callers.
pub struct CameraController {
    config: CameraConfig,
    driver: Option<Box<dyn CaptureDriver>>,
    inner: Mutex<Inner>,
}

impl CameraController {
    pub fn new(config: CameraConfig, driver: Option<Box<dyn CaptureDriver>>) -> Self {
        Self {
            config,
            driver,
            inner: Mutex::new(Inner {
                state: CameraState::Uninitialized,
                session: None,
            }),
        }
    }

    /// Initialize the camera if hardware access is required.
    ///
    /// Idempotent while mock or hardware capture is active. On acquisition
    /// failure the controller falls back to mock frames when configured,
    /// otherwise the error halts the caller.
    pub fn initialize(&self) -> Result<()> {
        let mut inner = self.lock();
        self.initialize_locked(&mut inner)
    }

    fn initialize_locked(&self, inner: &mut Inner) -> Result<()> {
        match inner.state {
            CameraState::MockActive | CameraState::HardwareActive => return Ok(()),
            CameraState::ShutDown => {
                return Err(Error::CameraUnavailable(
                    "camera controller has been shut down".to_string(),
                ))
            }
            CameraState::Uninitialized => {}
        }

        if self.config.use_mock {
            tracing::info!("camera controller configured to use mock frames");
            inner.state = CameraState::MockActive;
            return Ok(());
        }

        let driver = match self.driver.as_ref() {
            Some(driver) => driver,
            None => {
                return self.fall_back(inner, "no capture driver available");
            }
        };

        match driver.acquire(&self.config) {
            Ok(session) => {
                // Let auto-exposure settle before the first read.
                std::thread::sleep(self.config.warmup);
                inner.session = Some(session);
                inner.state = CameraState::HardwareActive;
                tracing::info!(
                    width = self.config.width,
                    height = self.config.height,
                    fps = self.config.fps,
                    "camera initialized"
                );
                Ok(())
            }
            Err(e) => self.fall_back(inner, &format!("camera initialisation failed: {}", e)),
        }
    }

    fn fall_back(&self, inner: &mut Inner, reason: &str) -> Result<()> {
        if self.config.fallback_to_mock_on_error {
            tracing::warn!(reason = %reason, "falling back to mock camera");
            inner.state = CameraState::MockActive;
            Ok(())
        } else {
            Err(Error::CameraUnavailable(reason.to_string()))
        }
    }

    /// Capture a single RGB frame from the camera or mock source.
    ///
    /// Starts the camera automatically on first use. Hardware read failures
    /// are propagated, never silently replaced by a mock frame.
    pub fn capture_frame(&self) -> Result<Frame> {
        let mut inner = self.lock();

        if inner.state == CameraState::Uninitialized {
            tracing::debug!("camera not initialized; attempting automatic start");
            self.initialize_locked(&mut inner)?;
        }

        match inner.state {
            CameraState::MockActive => Ok(frame::mock_frame(&self.config)),
            CameraState::HardwareActive => {
                let session = inner.session.as_mut().ok_or_else(|| {
                    Error::Internal("hardware capture active without a session".to_string())
                })?;
                session
                    .read_frame()
                    .map_err(|e| Error::CaptureFailed(e.to_string()))
            }
            CameraState::ShutDown => Err(Error::CameraUnavailable(
                "camera controller has been shut down".to_string(),
            )),
            CameraState::Uninitialized => Err(Error::CameraUnavailable(
                "camera failed to initialize".to_string(),
            )),
        }
    }

    /// Release camera resources. Idempotent; release errors are logged and
    /// swallowed so shutdown never fails.
    pub fn shutdown(&self) {
        let mut inner = self.lock();

        if let Some(mut session) = inner.session.take() {
            if let Err(e) = session.stop() {
                tracing::warn!(error = %e, "failed to gracefully stop capture session");
            }
        }

        if inner.state != CameraState::ShutDown {
            tracing::info!("camera controller shut down");
        }
        inner.state = CameraState::ShutDown;
    }

    /// Current controller status; never triggers side effects.
    pub fn status(&self) -> CameraStatus {
        let inner = self.lock();
        CameraStatus {
            available: matches!(
                inner.state,
                CameraState::MockActive | CameraState::HardwareActive
            ),
            using_mock: inner.state == CameraState::MockActive,
            width: self.config.width,
            height: self.config.height,
            fps: self.config.fps,
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
