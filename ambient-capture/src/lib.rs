//! Capture source (C1, §4.1): turn a raw OS screen grab into a resized,
//! JPEG-compressed `Capture`.

use std::io::Cursor;
use std::sync::Arc;

use ambient_core::capability::ScreenGrabber;
use ambient_core::{Capture, CaptureConfig, CaptureError};
use chrono::Utc;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{ImageBuffer, Rgba};
use tracing::debug;

pub struct CaptureSource {
    grabber: Arc<dyn ScreenGrabber>,
    config: CaptureConfig,
}

impl CaptureSource {
    pub fn new(grabber: Arc<dyn ScreenGrabber>, config: CaptureConfig) -> Self {
        Self { grabber, config }
    }

    /// §4.1 "Behavior": enumerate displays, grab the primary one, resize to
    /// fit the configured caps while preserving aspect ratio, encode JPEG.
    pub async fn capture_primary(&self) -> Result<Capture, CaptureError> {
        let count = self.grabber.count_displays().await?;
        if count == 0 {
            return Err(CaptureError::NoDisplay);
        }

        let bounds = self.grabber.bounds(0).await?;
        let raw = self.grabber.grab(bounds).await?;

        debug!(
            width = raw.width,
            height = raw.height,
            "Captured raw frame from primary display"
        );

        let (resized, width, height) = resize_to_fit(
            &raw.rgba,
            raw.width,
            raw.height,
            self.config.max_width,
            self.config.max_height,
        )?;

        let jpeg = encode_jpeg(&resized, width, height, self.config.effective_quality())?;

        Ok(Capture {
            captured_at: Utc::now(),
            display_index: 0,
            jpeg,
            width,
            height,
        })
    }
}

/// Scales `rgba` down by the smaller of the two caps' ratios so both
/// dimensions fit, preserving aspect ratio (§4.1). A cap of 0 disables that
/// axis. Returns the (possibly unchanged) buffer plus its final dimensions.
fn resize_to_fit(
    rgba: &[u8],
    width: u32,
    height: u32,
    max_width: u32,
    max_height: u32,
) -> Result<(Vec<u8>, u32, u32), CaptureError> {
    let needs_width_cap = max_width > 0 && width > max_width;
    let needs_height_cap = max_height > 0 && height > max_height;

    if !needs_width_cap && !needs_height_cap {
        return Ok((rgba.to_vec(), width, height));
    }

    let width_ratio = if max_width > 0 {
        max_width as f64 / width as f64
    } else {
        f64::INFINITY
    };
    let height_ratio = if max_height > 0 {
        max_height as f64 / height as f64
    } else {
        f64::INFINITY
    };
    let scale = width_ratio.min(height_ratio).min(1.0);

    let new_width = ((width as f64 * scale).round() as u32).max(1);
    let new_height = ((height as f64 * scale).round() as u32).max(1);

    let buffer: ImageBuffer<Rgba<u8>, Vec<u8>> =
        ImageBuffer::from_raw(width, height, rgba.to_vec())
            .ok_or_else(|| CaptureError::EncodeFailed("raw buffer size mismatch".to_string()))?;

    let resized = image::imageops::resize(&buffer, new_width, new_height, FilterType::Nearest);

    Ok((resized.into_raw(), new_width, new_height))
}

fn encode_jpeg(rgba: &[u8], width: u32, height: u32, quality: u8) -> Result<Vec<u8>, CaptureError> {
    let buffer: ImageBuffer<Rgba<u8>, Vec<u8>> = ImageBuffer::from_raw(width, height, rgba.to_vec())
        .ok_or_else(|| CaptureError::EncodeFailed("raw buffer size mismatch".to_string()))?;
    let rgb = image::DynamicImage::ImageRgba8(buffer).to_rgb8();

    let mut out = Vec::new();
    {
        let mut encoder = JpegEncoder::new_with_quality(Cursor::new(&mut out), quality);
        encoder
            .encode(
                rgb.as_raw(),
                width,
                height,
                image::ExtendedColorType::Rgb8,
            )
            .map_err(|e| CaptureError::EncodeFailed(e.to_string()))?;
    }

    Ok(out)
}
