// SPDX-License-Identifier: GPL-3.0-only

//! Camera acquisition
//!
//! Enumerates devices, picks one that matches the facing hint, and opens a
//! stream on the blocking pool. Backend errors are folded into the
//! user-facing [`DeviceError`] taxonomy here and nowhere else.

use crate::backends::camera::{
    BackendError, CameraBackend, CameraDevice, CameraStream, FacingMode, StreamConstraints,
};
use crate::errors::DeviceError;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Opens camera streams for the workflows
#[derive(Clone)]
pub struct DeviceAcquirer {
    backend: Arc<dyn CameraBackend>,
    constraints: StreamConstraints,
    device_index: Option<usize>,
}

impl DeviceAcquirer {
    pub fn new(backend: Arc<dyn CameraBackend>, constraints: StreamConstraints) -> Self {
        Self {
            backend,
            constraints,
            device_index: None,
        }
    }

    /// Always use the device at this enumeration index
    pub fn with_device_index(mut self, index: Option<usize>) -> Self {
        self.device_index = index;
        self
    }

    pub fn constraints(&self) -> &StreamConstraints {
        &self.constraints
    }

    /// Check if the platform can provide a camera at all
    pub fn is_supported(&self) -> bool {
        self.backend.is_available()
    }

    /// Enumerate video input devices
    pub fn devices(&self) -> Result<Vec<CameraDevice>, DeviceError> {
        self.backend
            .enumerate_cameras()
            .map_err(map_enumeration_error)
    }

    /// Pick a device for the facing hint
    ///
    /// For the rear camera any device labelled "back" or "rear" wins;
    /// otherwise the first device is used.
    pub fn select_device(devices: &[CameraDevice], facing: FacingMode) -> Option<&CameraDevice> {
        let preferred = match facing {
            FacingMode::Environment => devices.iter().find(|d| d.is_rear_facing()),
            FacingMode::User => devices.iter().find(|d| !d.is_rear_facing()),
            FacingMode::Any => None,
        };
        preferred.or_else(|| devices.first())
    }

    /// Open a stream on the selected device
    pub async fn acquire(&self) -> Result<Box<dyn CameraStream>, DeviceError> {
        let acquirer = self.clone();
        tokio::task::spawn_blocking(move || acquirer.acquire_blocking())
            .await
            .map_err(|e| {
                warn!(error = %e, "Camera acquisition task failed");
                DeviceError::InitializationFailed(e.to_string())
            })?
    }

    fn acquire_blocking(&self) -> Result<Box<dyn CameraStream>, DeviceError> {
        let devices = self.devices()?;
        debug!(count = devices.len(), "Video input devices");

        let device = match self.device_index {
            Some(index) => devices.get(index).ok_or(DeviceError::NoCameraFound)?,
            None => Self::select_device(&devices, self.constraints.facing)
                .ok_or(DeviceError::NoCameraFound)?,
        };

        info!(device = %device, "Selected camera");

        self.backend
            .open(device, &self.constraints)
            .map_err(map_open_error)
    }
}

fn map_enumeration_error(err: BackendError) -> DeviceError {
    warn!(error = %err, "Camera enumeration failed");
    match err {
        BackendError::PermissionDenied(_) => DeviceError::PermissionDenied,
        BackendError::NotAvailable(_) => DeviceError::Unsupported,
        other => DeviceError::EnumerationFailed(other.to_string()),
    }
}

fn map_open_error(err: BackendError) -> DeviceError {
    warn!(error = %err, "Failed to open camera");
    match err {
        BackendError::PermissionDenied(_) => DeviceError::PermissionDenied,
        BackendError::DeviceNotFound(_) => DeviceError::NoCameraFound,
        BackendError::NotAvailable(_) => DeviceError::Unsupported,
        other => DeviceError::InitializationFailed(other.to_string()),
    }
}
