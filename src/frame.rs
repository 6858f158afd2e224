//! Frame utilities
//!
//! Pure image plumbing shared by the camera and detector: synthetic mock
//! frames, base64 payload decoding, and lossless PNG encoding for responses.

use crate::config::CameraConfig;
use crate::error::{Error, Result};
use base64::Engine;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use std::io::Cursor;

/// A frame is always a 3-channel, 8-bit RGB image.
pub type Frame = RgbImage;

/// Generate a deterministic, uniformly filled frame at the configured size.
pub fn mock_frame(config: &CameraConfig) -> Frame {
    let value = config.mock_frame_color.fill_value();
    RgbImage::from_pixel(config.width, config.height, Rgb([value, value, value]))
}

/// Decode a base64 encoded image payload into an RGB frame.
///
/// Both a bad base64 string and undecodable image bytes are client input
/// errors; the two cases carry distinct messages.
pub fn decode_base64_image(data: &str) -> Result<Frame> {
    let raw = base64::engine::general_purpose::STANDARD
        .decode(data)
        .map_err(|e| Error::InvalidImagePayload(format!("invalid base64 payload: {}", e)))?;

    let decoded = image::load_from_memory(&raw)
        .map_err(|e| Error::InvalidImagePayload(format!("unable to decode image: {}", e)))?;

    Ok(decoded.to_rgb8())
}

/// Encode a frame as base64 PNG (lossless).
pub fn encode_png_base64(frame: &Frame) -> Result<String> {
    let mut buffer = Vec::new();
    DynamicImage::ImageRgb8(frame.clone())
        .write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
        .map_err(|e| Error::Internal(format!("failed to encode frame as PNG: {}", e)))?;

    Ok(base64::engine::general_purpose::STANDARD.encode(&buffer))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MockFrameColor;

    fn small_config(color: MockFrameColor) -> CameraConfig {
        CameraConfig {
            width: 8,
            height: 6,
            mock_frame_color: color,
            ..CameraConfig::default()
        }
    }

    #[test]
    fn test_mock_frame_dimensions_and_fill() {
        for (color, value) in [
            (MockFrameColor::Black, 0u8),
            (MockFrameColor::White, 255),
            (MockFrameColor::Gray, 127),
        ] {
            let frame = mock_frame(&small_config(color));
            assert_eq!(frame.width(), 8);
            assert_eq!(frame.height(), 6);
            assert!(frame.pixels().all(|p| p.0 == [value, value, value]));
        }
    }

    #[test]
    fn test_decode_rejects_bad_base64() {
        let err = decode_base64_image("not-base64").unwrap_err();
        assert!(matches!(err, Error::InvalidImagePayload(_)));
    }

    #[test]
    fn test_decode_rejects_non_image_bytes() {
        let payload = base64::engine::general_purpose::STANDARD.encode(b"plain text");
        let err = decode_base64_image(&payload).unwrap_err();
        assert!(matches!(err, Error::InvalidImagePayload(_)));
    }

    #[test]
    fn test_png_round_trip_is_pixel_identical() {
        let frame = mock_frame(&small_config(MockFrameColor::Gray));
        let encoded = encode_png_base64(&frame).unwrap();
        let decoded = decode_base64_image(&encoded).unwrap();
        assert_eq!(decoded, frame);
    }
}
