// SPDX-License-Identifier: GPL-3.0-only

//! Still image camera source
//!
//! Presents an image file as a single camera that repeats the same frame at
//! roughly 30fps. Used for headless scanning of saved photos and in tests.

use super::types::*;
use super::{CameraBackend, CameraStream};
use crate::constants::{file_formats, timing};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Backend serving frames from one image file
pub struct StillImageBackend {
    path: PathBuf,
}

impl StillImageBackend {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    fn device(&self) -> CameraDevice {
        let label = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "image".to_string());
        CameraDevice::new(self.path.to_string_lossy(), label)
    }
}

impl CameraBackend for StillImageBackend {
    fn is_available(&self) -> bool {
        self.path.is_file()
    }

    fn enumerate_cameras(&self) -> BackendResult<Vec<CameraDevice>> {
        if !self.path.is_file() {
            return Ok(Vec::new());
        }
        Ok(vec![self.device()])
    }

    fn open(
        &self,
        device: &CameraDevice,
        _constraints: &StreamConstraints,
    ) -> BackendResult<Box<dyn CameraStream>> {
        let frame = load_image_as_frame(&self.path)?;
        Ok(Box::new(StillImageStream {
            device: device.clone(),
            frame,
            active: true,
            delivered: 0,
        }))
    }

    fn backend_type(&self) -> CameraBackendType {
        CameraBackendType::StillImage(self.path.clone())
    }
}

/// Stream that repeats one frame until stopped
struct StillImageStream {
    device: CameraDevice,
    frame: CameraFrame,
    active: bool,
    delivered: u64,
}

impl CameraStream for StillImageStream {
    fn device(&self) -> &CameraDevice {
        &self.device
    }

    fn next_frame(&mut self) -> BackendResult<CameraFrame> {
        if !self.active {
            return Err(BackendError::StreamStopped);
        }
        // Pace like a live camera so the decode loop does not spin
        if self.delivered > 0 {
            std::thread::sleep(timing::STILL_IMAGE_FRAME_DURATION);
        }
        self.delivered += 1;

        let mut frame = self.frame.clone();
        frame.captured_at = Instant::now();
        Ok(frame)
    }

    fn stop(&mut self) {
        if self.active {
            debug!(device = %self.device, frames = self.delivered, "Still image stream stopped");
        }
        self.active = false;
    }

    fn is_active(&self) -> bool {
        self.active
    }
}

/// Load an image file as an RGBA camera frame
pub fn load_image_as_frame(path: &Path) -> BackendResult<CameraFrame> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();

    if !file_formats::is_image_extension(&extension) {
        return Err(BackendError::FormatNotSupported(format!(
            "Unsupported file format: {}",
            extension
        )));
    }

    info!(path = %path.display(), "Loading image file");

    let img = image::open(path).map_err(|e| {
        BackendError::IoError(format!("Failed to load image '{}': {}", path.display(), e))
    })?;

    let rgba = img.to_rgba8();
    let width = rgba.width();
    let height = rgba.height();

    debug!(width, height, "Image loaded successfully");

    Ok(CameraFrame {
        data: Arc::from(rgba.into_raw().into_boxed_slice()),
        width,
        height,
        stride: width * 4,
        format: PixelFormat::RGBA,
        captured_at: Instant::now(),
    })
}
