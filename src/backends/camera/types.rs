// SPDX-License-Identifier: GPL-3.0-only
// Shared types for camera backend abstraction

//! Shared types for camera backends

use crate::constants::capture;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;

/// Camera backend type
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CameraBackendType {
    /// Video4Linux2 capture devices
    #[default]
    V4l2,
    /// A still image file presented as a camera (testing, headless use)
    StillImage(PathBuf),
}

impl std::fmt::Display for CameraBackendType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CameraBackendType::V4l2 => write!(f, "V4L2"),
            CameraBackendType::StillImage(path) => write!(f, "still image ({})", path.display()),
        }
    }
}

/// Which way the camera should face
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FacingMode {
    /// Rear camera, pointing away from the user
    #[default]
    Environment,
    /// Front camera, pointing at the user
    User,
    /// No preference
    Any,
}

/// Capability hint passed when opening a stream
///
/// Values are ideals, not requirements: a backend picks the closest format
/// the device offers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamConstraints {
    pub ideal_width: u32,
    pub ideal_height: u32,
    pub facing: FacingMode,
}

impl Default for StreamConstraints {
    fn default() -> Self {
        Self {
            ideal_width: capture::IDEAL_WIDTH,
            ideal_height: capture::IDEAL_HEIGHT,
            facing: FacingMode::Environment,
        }
    }
}

/// Represents a camera device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CameraDevice {
    /// Backend-specific identifier (device path for V4L2)
    pub id: String,
    /// Human-readable label reported by the driver
    pub label: String,
}

impl CameraDevice {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
        }
    }

    /// Check if the label identifies a rear-facing camera
    pub fn is_rear_facing(&self) -> bool {
        let label = self.label.to_lowercase();
        capture::REAR_CAMERA_HINTS
            .iter()
            .any(|hint| label.contains(hint))
    }
}

impl std::fmt::Display for CameraDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.label, self.id)
    }
}

/// Pixel format for camera frames
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    /// RGBA - 32-bit with alpha (4 bytes per pixel)
    RGBA,
    /// RGB24 - 24-bit RGB (3 bytes per pixel, no alpha)
    RGB24,
    /// Gray8 - 8-bit grayscale (single channel)
    Gray8,
    /// YUYV - Packed 4:2:2 (Y0 U Y1 V interleaved)
    YUYV,
}

impl PixelFormat {
    /// Bytes per pixel in the packed layout
    pub fn bytes_per_pixel(&self) -> u32 {
        match self {
            Self::RGBA => 4,
            Self::RGB24 => 3,
            Self::Gray8 => 1,
            Self::YUYV => 2,
        }
    }
}

/// A single frame from the camera
#[derive(Debug, Clone)]
pub struct CameraFrame {
    pub width: u32,
    pub height: u32,
    /// Packed pixel data
    pub data: Arc<[u8]>,
    /// Pixel format of the data
    pub format: PixelFormat,
    /// Row stride in bytes (may include padding)
    pub stride: u32,
    /// Timestamp when frame was captured
    pub captured_at: Instant,
}

impl CameraFrame {
    /// Create a tightly packed frame
    pub fn packed(width: u32, height: u32, format: PixelFormat, data: Vec<u8>) -> Self {
        Self {
            width,
            height,
            stride: width * format.bytes_per_pixel(),
            data: Arc::from(data),
            format,
            captured_at: Instant::now(),
        }
    }

    /// Check that the buffer is large enough for the declared geometry
    pub fn is_complete(&self) -> bool {
        if self.height == 0 || self.width == 0 {
            return false;
        }
        let row = (self.width * self.format.bytes_per_pixel()) as usize;
        let needed = self.stride as usize * (self.height as usize - 1) + row;
        self.stride as usize >= row && self.data.len() >= needed
    }
}

/// Result type for backend operations
pub type BackendResult<T> = Result<T, BackendError>;

/// Error types for backend operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    /// Backend is not available on this system
    #[error("Backend not available: {0}")]
    NotAvailable(String),
    /// Access to the device was refused
    #[error("Permission denied: {0}")]
    PermissionDenied(String),
    /// Camera device not found
    #[error("Device not found: {0}")]
    DeviceNotFound(String),
    /// Failed to open or configure the device
    #[error("Initialization failed: {0}")]
    InitializationFailed(String),
    /// Format not supported
    #[error("Format not supported: {0}")]
    FormatNotSupported(String),
    /// The stream was stopped
    #[error("Stream stopped")]
    StreamStopped,
    /// General I/O error
    #[error("I/O error: {0}")]
    IoError(String),
}

impl BackendError {
    /// Classify an I/O error raised while opening a device
    pub fn from_open_error(device: &str, err: &std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::PermissionDenied => {
                BackendError::PermissionDenied(format!("{}: {}", device, err))
            }
            std::io::ErrorKind::NotFound => {
                BackendError::DeviceNotFound(format!("{}: {}", device, err))
            }
            _ => BackendError::InitializationFailed(format!("{}: {}", device, err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rear_facing_labels() {
        assert!(CameraDevice::new("/dev/video2", "Back Camera").is_rear_facing());
        assert!(CameraDevice::new("/dev/video3", "camera2 REAR").is_rear_facing());
        assert!(!CameraDevice::new("/dev/video0", "Integrated Webcam").is_rear_facing());
    }

    #[test]
    fn test_frame_completeness_with_stride() {
        let frame = CameraFrame {
            width: 2,
            height: 2,
            data: Arc::from(vec![0u8; 18].as_slice()),
            format: PixelFormat::RGBA,
            stride: 10,
            captured_at: Instant::now(),
        };
        assert!(frame.is_complete());

        let short = CameraFrame {
            data: Arc::from(vec![0u8; 12].as_slice()),
            ..frame
        };
        assert!(!short.is_complete());
    }

    #[test]
    fn test_open_error_classification() {
        let denied = std::io::Error::from(std::io::ErrorKind::PermissionDenied);
        assert!(matches!(
            BackendError::from_open_error("/dev/video0", &denied),
            BackendError::PermissionDenied(_)
        ));

        let missing = std::io::Error::from(std::io::ErrorKind::NotFound);
        assert!(matches!(
            BackendError::from_open_error("/dev/video9", &missing),
            BackendError::DeviceNotFound(_)
        ));
    }
}
