//! Screen capture from the connected Android device.

use thiserror::Error;

use super::connection::AdbConnection;
use crate::tools::{Screenshot, ToolsError};

const PNG_SIGNATURE: &[u8; 8] = b"\x89PNG\r\n\x1a\n";

/// Screenshot errors.
#[derive(Error, Debug)]
pub enum ScreenshotError {
    #[error("Failed to capture screenshot: {0}")]
    CaptureFailed(String),
    #[error("Screen capture refused (secure window): {0}")]
    Refused(String),
    #[error("Failed to read image: {0}")]
    ImageReadFailed(String),
}

impl From<ScreenshotError> for ToolsError {
    fn from(err: ScreenshotError) -> Self {
        ToolsError::Capture(err.to_string())
    }
}

/// Capture a screenshot with `adb exec-out screencap -p`.
///
/// Output goes straight to stdout, avoiding disk I/O on device and host.
/// Secure screens (payment pages, password fields) produce an error rather
/// than a blank image.
pub async fn get_screenshot(conn: &AdbConnection) -> Result<Screenshot, ScreenshotError> {
    let (png_data, stderr) = conn
        .exec_out(&["screencap", "-p"])
        .await
        .map_err(|e| ScreenshotError::CaptureFailed(e.to_string()))?;

    if stderr.contains("Status: -1") || stderr.contains("Failed") || stderr.contains("error") {
        tracing::warn!("Screenshot refused (sensitive screen): {}", stderr.trim());
        return Err(ScreenshotError::Refused(stderr.trim().to_string()));
    }

    let (width, height) = decode_png_dimensions(&png_data)?;
    let id = format!(
        "screenshot-{}-{}x{}",
        chrono::Utc::now().format("%Y%m%dT%H%M%S%.3f"),
        width,
        height
    );
    Ok(Screenshot::png(id, width, height, png_data))
}

/// Validate PNG data and read its dimensions.
pub(crate) fn decode_png_dimensions(png_data: &[u8]) -> Result<(u32, u32), ScreenshotError> {
    if png_data.len() < PNG_SIGNATURE.len() {
        return Err(ScreenshotError::ImageReadFailed(format!(
            "screenshot data too small: {} bytes",
            png_data.len()
        )));
    }
    if &png_data[0..8] != PNG_SIGNATURE {
        return Err(ScreenshotError::ImageReadFailed(format!(
            "invalid PNG header: {:?}",
            &png_data[0..8]
        )));
    }

    let img = image::load_from_memory(png_data)
        .map_err(|e| ScreenshotError::ImageReadFailed(e.to_string()))?;
    Ok((img.width(), img.height()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, ImageFormat, RgbImage};
    use std::io::Cursor;

    fn png(width: u32, height: u32) -> Vec<u8> {
        let img = RgbImage::from_fn(width, height, |_, _| image::Rgb([0u8, 0u8, 0u8]));
        let mut buffer = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(img)
            .write_to(&mut buffer, ImageFormat::Png)
            .unwrap();
        buffer.into_inner()
    }

    #[test]
    fn test_decode_png_dimensions() {
        assert_eq!(decode_png_dimensions(&png(12, 34)).unwrap(), (12, 34));
    }

    #[test]
    fn test_rejects_short_and_non_png() {
        assert!(matches!(
            decode_png_dimensions(b"\x89PN"),
            Err(ScreenshotError::ImageReadFailed(_))
        ));
        assert!(matches!(
            decode_png_dimensions(b"GIF89a-not-a-png"),
            Err(ScreenshotError::ImageReadFailed(_))
        ));
    }

    #[test]
    fn test_error_maps_to_capture() {
        let err: ToolsError = ScreenshotError::Refused("Status: -1".to_string()).into();
        assert!(matches!(err, ToolsError::Capture(_)));
    }
}
