//! Error handling for the edge inference endpoint

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Error types
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Camera hardware absent or shut down, and mock fallback disabled
    #[error("Camera unavailable: {0}")]
    CameraUnavailable(String),

    /// Hardware frame read error
    #[error("Capture failed: {0}")]
    CaptureFailed(String),

    /// Client asked for an uploaded frame but sent no payload
    #[error("image_base64 payload required when capture_from_camera is false")]
    MissingImagePayload,

    /// Client payload is not decodable image bytes
    #[error("Invalid image payload: {0}")]
    InvalidImagePayload(String),

    /// Config error
    #[error("Config error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match &self {
            Error::CameraUnavailable(msg) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "CAMERA_UNAVAILABLE",
                msg.clone(),
            ),
            Error::CaptureFailed(msg) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "CAPTURE_FAILED",
                msg.clone(),
            ),
            Error::MissingImagePayload => (
                StatusCode::BAD_REQUEST,
                "MISSING_IMAGE_PAYLOAD",
                self.to_string(),
            ),
            Error::InvalidImagePayload(msg) => (
                StatusCode::BAD_REQUEST,
                "INVALID_IMAGE_PAYLOAD",
                msg.clone(),
            ),
            Error::Config(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "CONFIG_ERROR",
                msg.clone(),
            ),
            Error::Io(e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "IO_ERROR",
                e.to_string(),
            ),
            Error::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                msg.clone(),
            ),
        };

        tracing::error!(
            status = %status,
            error_code = %error_code,
            message = %message,
            "Request error"
        );

        let body = Json(json!({
            "error_code": error_code,
            "message": message
        }));

        (status, body).into_response()
    }
}
