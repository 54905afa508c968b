// SPDX-License-Identifier: MPL-2.0

//! Camera backend abstraction
//!
//! Backends hand out live streams that the capture workflows pull frames
//! from. The workflow never touches a device directly.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────┐
//! │ BarcodeScanner /         │
//! │ FoodRecognizer           │
//! └────────────┬─────────────┘
//!              │
//!              ▼
//! ┌──────────────────────────┐
//! │ DeviceAcquirer           │  ← device selection, error mapping
//! └────────────┬─────────────┘
//!              │
//!              ▼
//! ┌──────────────────────────┐
//! │ CameraBackend trait      │  ← enumeration, stream creation
//! └────────────┬─────────────┘
//!              │
//!        ┌─────┴──────┐
//!        ▼            ▼
//!    ┌───────┐  ┌────────────┐
//!    │ V4L2  │  │ StillImage │
//!    └───────┘  └────────────┘
//! ```

pub mod format_converters;
pub mod still_image;
pub mod types;
pub mod v4l2;

pub use types::*;

use std::sync::Arc;

/// Camera backend trait
///
/// Implementations must be cheap to share; the workflows hold them in an
/// `Arc` and call them from blocking tasks.
pub trait CameraBackend: Send + Sync {
    /// Check if this backend can provide cameras at all on this system
    fn is_available(&self) -> bool;

    /// Enumerate available video input devices
    fn enumerate_cameras(&self) -> BackendResult<Vec<CameraDevice>>;

    /// Open a live stream on the given device
    ///
    /// This may block while the device negotiates a format.
    fn open(
        &self,
        device: &CameraDevice,
        constraints: &StreamConstraints,
    ) -> BackendResult<Box<dyn CameraStream>>;

    /// Get the backend type identifier
    fn backend_type(&self) -> CameraBackendType;
}

/// A live camera stream
///
/// `stop` releases the device and must be safe to call any number of times.
/// After `stop`, `next_frame` returns [`BackendError::StreamStopped`].
pub trait CameraStream: Send {
    /// Device this stream was opened on
    fn device(&self) -> &CameraDevice;

    /// Block until the next frame is available
    fn next_frame(&mut self) -> BackendResult<CameraFrame>;

    /// Stop all tracks and release the device
    fn stop(&mut self);

    /// Check if the stream is still delivering frames
    fn is_active(&self) -> bool;
}

/// Get a concrete backend instance for a backend type
pub fn get_backend_for_type(backend_type: &CameraBackendType) -> Arc<dyn CameraBackend> {
    match backend_type {
        CameraBackendType::V4l2 => Arc::new(v4l2::V4l2Backend::new()),
        CameraBackendType::StillImage(path) => {
            Arc::new(still_image::StillImageBackend::new(path.clone()))
        }
    }
}
