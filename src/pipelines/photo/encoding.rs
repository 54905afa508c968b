// SPDX-License-Identifier: GPL-3.0-only

//! JPEG encoding of recognition snapshots
//!
//! Frames are converted to RGB, scaled down to fit the upload bounds and
//! encoded as JPEG. All work runs on the blocking pool.

use crate::backends::camera::format_converters::frame_to_rgb_image;
use crate::backends::camera::types::CameraFrame;
use crate::constants::capture;
use image::RgbImage;
use image::imageops::FilterType;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

/// Encoded JPEG ready for upload
#[derive(Debug, Clone)]
pub struct EncodedImage {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// Photo encoder
#[derive(Debug, Clone, Copy)]
pub struct PhotoEncoder {
    quality: u8,
    max_width: u32,
    max_height: u32,
}

impl Default for PhotoEncoder {
    fn default() -> Self {
        Self::new(
            capture::JPEG_QUALITY,
            capture::IDEAL_WIDTH,
            capture::IDEAL_HEIGHT,
        )
    }
}

impl PhotoEncoder {
    /// Create an encoder; quality is clamped to 1-100
    pub fn new(quality: u8, max_width: u32, max_height: u32) -> Self {
        Self {
            quality: quality.clamp(1, 100),
            max_width: max_width.max(1),
            max_height: max_height.max(1),
        }
    }

    pub fn quality(&self) -> u8 {
        self.quality
    }

    /// Encode a frame asynchronously
    pub async fn encode(&self, frame: Arc<CameraFrame>) -> Result<EncodedImage, String> {
        info!(
            width = frame.width,
            height = frame.height,
            quality = self.quality,
            "Starting encoding"
        );

        let encoder = *self;
        tokio::task::spawn_blocking(move || encoder.encode_sync(&frame))
            .await
            .map_err(|e| format!("Encoding task error: {}", e))?
    }

    /// Encode a frame on the current thread
    pub fn encode_sync(&self, frame: &CameraFrame) -> Result<EncodedImage, String> {
        let rgb = frame_to_rgb_image(frame).ok_or_else(|| {
            format!(
                "Incomplete {}x{} frame ({} bytes)",
                frame.width,
                frame.height,
                frame.data.len()
            )
        })?;
        let rgb = self.fit(rgb);
        let data = encode_jpeg(&rgb, self.quality)?;

        debug!(
            size = data.len(),
            width = rgb.width(),
            height = rgb.height(),
            "Encoding complete"
        );

        Ok(EncodedImage {
            data,
            width: rgb.width(),
            height: rgb.height(),
        })
    }

    /// Scale down to fit the bounds, keeping the aspect ratio
    fn fit(&self, image: RgbImage) -> RgbImage {
        let (width, height) = image.dimensions();
        if width <= self.max_width && height <= self.max_height {
            return image;
        }

        let scale = (self.max_width as f64 / width as f64).min(self.max_height as f64 / height as f64);
        let new_width = ((width as f64 * scale).round() as u32).clamp(1, self.max_width);
        let new_height = ((height as f64 * scale).round() as u32).clamp(1, self.max_height);
        debug!(width, height, new_width, new_height, "Scaling snapshot");

        image::imageops::resize(&image, new_width, new_height, FilterType::Triangle)
    }

    /// Save an encoded snapshot with a timestamped name
    pub async fn save(&self, encoded: &EncodedImage, output_dir: PathBuf) -> Result<PathBuf, String> {
        let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
        let filepath = output_dir.join(format!("FOOD_{}.jpg", timestamp));

        info!(path = %filepath.display(), "Saving snapshot");

        let data = encoded.data.clone();
        let target = filepath.clone();
        tokio::task::spawn_blocking(move || {
            std::fs::create_dir_all(&output_dir)
                .map_err(|e| format!("Failed to create {}: {}", output_dir.display(), e))?;
            std::fs::write(&target, &data).map_err(|e| format!("Failed to save snapshot: {}", e))
        })
        .await
        .map_err(|e| format!("Save task error: {}", e))??;

        Ok(filepath)
    }
}

fn encode_jpeg(image: &RgbImage, quality: u8) -> Result<Vec<u8>, String> {
    let mut buffer = Vec::new();
    let mut cursor = std::io::Cursor::new(&mut buffer);
    let mut encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut cursor, quality);

    encoder
        .encode(
            image.as_raw(),
            image.width(),
            image.height(),
            image::ExtendedColorType::Rgb8,
        )
        .map_err(|e| format!("JPEG encoding failed: {}", e))?;

    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::camera::types::PixelFormat;

    #[test]
    fn test_large_frame_fits_bounds() {
        let frame = CameraFrame::packed(1280, 720, PixelFormat::RGB24, vec![100; 1280 * 720 * 3]);
        let encoded = PhotoEncoder::default().encode_sync(&frame).unwrap();

        assert_eq!((encoded.width, encoded.height), (640, 360));
        // JPEG SOI marker
        assert_eq!(&encoded.data[..2], &[0xFF, 0xD8]);

        let decoded = image::load_from_memory(&encoded.data).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (640, 360));
    }

    #[test]
    fn test_small_frame_keeps_size() {
        let frame = CameraFrame::packed(320, 240, PixelFormat::RGBA, vec![200; 320 * 240 * 4]);
        let encoded = PhotoEncoder::default().encode_sync(&frame).unwrap();
        assert_eq!((encoded.width, encoded.height), (320, 240));
    }

    #[test]
    fn test_quality_clamped() {
        assert_eq!(PhotoEncoder::new(0, 640, 480).quality(), 1);
        assert_eq!(PhotoEncoder::new(250, 640, 480).quality(), 100);
    }

    #[tokio::test]
    async fn test_save_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let encoder = PhotoEncoder::default();
        let frame = Arc::new(CameraFrame::packed(8, 8, PixelFormat::Gray8, vec![50; 64]));
        let encoded = encoder.encode(frame).await.unwrap();

        let path = encoder.save(&encoded, dir.path().join("snaps")).await.unwrap();
        assert!(path.file_name().unwrap().to_string_lossy().starts_with("FOOD_"));
        assert_eq!(std::fs::read(&path).unwrap(), encoded.data);
    }
}
