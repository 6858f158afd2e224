//! Service configuration
//!
//! ## Responsibilities
//!
//! - Environment-based configuration with the `EDGE_` prefix
//! - Nested overrides for camera and model sub-configuration (`EDGE_CAMERA__WIDTH` etc.)
//! - Validation of threshold ranges and dimensions
//!
//! `AppConfig::from_env()` is the single construction point. It is called once
//! in `main` and the resulting value is passed down explicitly; no module reads
//! the environment on its own after startup.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Fill colour used for synthetic mock frames
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MockFrameColor {
    Black,
    White,
    Gray,
}

impl MockFrameColor {
    /// Per-channel fill value for the mock frame
    pub fn fill_value(&self) -> u8 {
        match self {
            MockFrameColor::Black => 0,
            MockFrameColor::White => 255,
            MockFrameColor::Gray => 127,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MockFrameColor::Black => "black",
            MockFrameColor::White => "white",
            MockFrameColor::Gray => "gray",
        }
    }
}

impl fmt::Display for MockFrameColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MockFrameColor {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "black" => Ok(MockFrameColor::Black),
            "white" => Ok(MockFrameColor::White),
            "gray" => Ok(MockFrameColor::Gray),
            other => Err(format!(
                "unknown mock frame color '{}' (expected black, white or gray)",
                other
            )),
        }
    }
}

/// Camera capture configuration (immutable after construction)
#[derive(Debug, Clone)]
pub struct CameraConfig {
    /// Capture width in pixels
    pub width: u32,
    /// Capture height in pixels
    pub height: u32,
    /// Target frames per second; descriptive metadata only, never enforced
    pub fps: u32,
    /// Wait after hardware start so auto-exposure can settle
    pub warmup: Duration,
    /// Force mock frames regardless of hardware availability
    pub use_mock: bool,
    /// Fall back to mock frames when hardware acquisition fails
    pub fallback_to_mock_on_error: bool,
    /// Fill colour for mock frames
    pub mock_frame_color: MockFrameColor,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            fps: 30,
            warmup: Duration::from_secs_f64(2.0),
            use_mock: false,
            fallback_to_mock_on_error: true,
            mock_frame_color: MockFrameColor::Black,
        }
    }
}

impl CameraConfig {
    fn from_env() -> Result<Self> {
        let defaults = Self::default();
        let warmup_seconds = parse_env("EDGE_CAMERA__WARMUP_SECONDS", defaults.warmup.as_secs_f64())?;
        if !warmup_seconds.is_finite() || warmup_seconds < 0.0 {
            return Err(Error::Config(format!(
                "EDGE_CAMERA__WARMUP_SECONDS must be a non-negative number, got {}",
                warmup_seconds
            )));
        }

        let config = Self {
            width: parse_env("EDGE_CAMERA__WIDTH", defaults.width)?,
            height: parse_env("EDGE_CAMERA__HEIGHT", defaults.height)?,
            fps: parse_env("EDGE_CAMERA__FPS", defaults.fps)?,
            warmup: Duration::from_secs_f64(warmup_seconds),
            use_mock: parse_bool_env("EDGE_CAMERA__USE_MOCK", defaults.use_mock)?,
            fallback_to_mock_on_error: parse_bool_env(
                "EDGE_CAMERA__FALLBACK_TO_MOCK_ON_ERROR",
                defaults.fallback_to_mock_on_error,
            )?,
            mock_frame_color: parse_env(
                "EDGE_CAMERA__MOCK_FRAME_COLOR",
                defaults.mock_frame_color,
            )?,
        };

        if config.width == 0 || config.height == 0 {
            return Err(Error::Config(
                "camera width and height must be positive".to_string(),
            ));
        }

        Ok(config)
    }
}

/// Detection model configuration (immutable after construction)
#[derive(Debug, Clone)]
pub struct ModelConfig {
    /// Filesystem path to the model weights
    pub path: PathBuf,
    /// Confidence threshold applied during inference, in [0, 1]
    pub confidence_threshold: f32,
    /// IoU threshold for non-max suppression, in [0, 1]
    pub iou_threshold: f32,
    /// Load the model during startup instead of lazily on demand
    pub autoload: bool,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("models/yolo-v11n.pt"),
            confidence_threshold: 0.25,
            iou_threshold: 0.45,
            autoload: false,
        }
    }
}

impl ModelConfig {
    fn from_env() -> Result<Self> {
        let defaults = Self::default();
        let config = Self {
            path: env_var("EDGE_MODEL__PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.path),
            confidence_threshold: parse_env(
                "EDGE_MODEL__CONFIDENCE_THRESHOLD",
                defaults.confidence_threshold,
            )?,
            iou_threshold: parse_env("EDGE_MODEL__IOU_THRESHOLD", defaults.iou_threshold)?,
            autoload: parse_bool_env("EDGE_MODEL__AUTOLOAD", defaults.autoload)?,
        };

        for (key, value) in [
            ("EDGE_MODEL__CONFIDENCE_THRESHOLD", config.confidence_threshold),
            ("EDGE_MODEL__IOU_THRESHOLD", config.iou_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(Error::Config(format!(
                    "{} must be within [0, 1], got {}",
                    key, value
                )));
            }
        }

        Ok(config)
    }

    /// Model path rendered for status payloads and log fields
    pub fn path_display(&self) -> String {
        self.path.display().to_string()
    }
}

/// Top-level service configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Bind address
    pub host: String,
    /// TCP port
    pub port: u16,
    /// Initialize the camera during startup
    pub autostart_camera: bool,
    pub camera: CameraConfig,
    pub model: ModelConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            autostart_camera: false,
            camera: CameraConfig::default(),
            model: ModelConfig::default(),
        }
    }
}

impl AppConfig {
    /// Build the configuration from `EDGE_`-prefixed environment variables.
    ///
    /// Single construction point for the whole process; call once in `main`.
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();
        Ok(Self {
            host: env_var("EDGE_HOST").unwrap_or(defaults.host),
            port: parse_env("EDGE_PORT", defaults.port)?,
            autostart_camera: parse_bool_env("EDGE_AUTOSTART_CAMERA", defaults.autostart_camera)?,
            camera: CameraConfig::from_env()?,
            model: ModelConfig::from_env()?,
        })
    }
}

fn env_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    match env_var(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| Error::Config(format!("invalid value for {}: {}", key, e))),
    }
}

fn parse_bool_env(key: &str, default: bool) -> Result<bool> {
    match env_var(key) {
        None => Ok(default),
        Some(raw) => match raw.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Ok(true),
            "false" | "0" | "no" | "off" => Ok(false),
            other => Err(Error::Config(format!(
                "invalid boolean for {}: '{}'",
                key, other
            ))),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_frame_color_fill_values() {
        assert_eq!(MockFrameColor::Black.fill_value(), 0);
        assert_eq!(MockFrameColor::White.fill_value(), 255);
        assert_eq!(MockFrameColor::Gray.fill_value(), 127);
    }

    #[test]
    fn test_mock_frame_color_from_str() {
        assert_eq!("black".parse::<MockFrameColor>(), Ok(MockFrameColor::Black));
        assert_eq!("WHITE".parse::<MockFrameColor>(), Ok(MockFrameColor::White));
        assert_eq!("Gray".parse::<MockFrameColor>(), Ok(MockFrameColor::Gray));
        assert!("magenta".parse::<MockFrameColor>().is_err());
    }

    #[test]
    fn test_defaults_match_documented_values() {
        let config = AppConfig::default();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 8000);
        assert!(!config.autostart_camera);
        assert_eq!(config.camera.width, 1280);
        assert_eq!(config.camera.height, 720);
        assert_eq!(config.camera.fps, 30);
        assert_eq!(config.camera.warmup, Duration::from_secs(2));
        assert!(config.camera.fallback_to_mock_on_error);
        assert_eq!(config.model.confidence_threshold, 0.25);
        assert_eq!(config.model.iou_threshold, 0.45);
        assert!(!config.model.autoload);
    }
}
