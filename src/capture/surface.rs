// SPDX-License-Identifier: GPL-3.0-only

//! Video surface shared between a capture session and its host
//!
//! The host renders `latest_frame` as a live preview. A session binds its
//! device on acquisition and detaches it on release, after which the
//! surface shows nothing.

use crate::backends::camera::types::{CameraDevice, CameraFrame};
use std::sync::{Arc, Mutex};
use tracing::debug;

#[derive(Debug, Default)]
struct SurfaceState {
    source: Option<CameraDevice>,
    latest: Option<CameraFrame>,
    frames: u64,
}

/// Preview sink for a live camera stream
#[derive(Debug, Clone, Default)]
pub struct VideoSurface {
    state: Arc<Mutex<SurfaceState>>,
}

impl VideoSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a device as the surface's source
    pub fn attach(&self, device: &CameraDevice) {
        if let Ok(mut state) = self.state.lock() {
            debug!(device = %device, "Video surface attached");
            state.source = Some(device.clone());
            state.latest = None;
            state.frames = 0;
        }
    }

    /// Clear the source and drop the last frame
    pub fn detach(&self) {
        if let Ok(mut state) = self.state.lock() {
            if state.source.take().is_some() {
                debug!(frames = state.frames, "Video surface detached");
            }
            state.latest = None;
        }
    }

    /// Currently bound device
    pub fn source(&self) -> Option<CameraDevice> {
        self.state.lock().ok()?.source.clone()
    }

    pub fn is_attached(&self) -> bool {
        self.source().is_some()
    }

    /// Show a frame; ignored while detached
    pub fn publish(&self, frame: CameraFrame) {
        if let Ok(mut state) = self.state.lock() {
            if state.source.is_some() {
                state.latest = Some(frame);
                state.frames += 1;
            }
        }
    }

    pub fn latest_frame(&self) -> Option<CameraFrame> {
        self.state.lock().ok()?.latest.clone()
    }

    /// Frames shown since the last attach
    pub fn frames_published(&self) -> u64 {
        self.state.lock().map(|s| s.frames).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::camera::types::PixelFormat;

    #[test]
    fn test_publish_requires_source() {
        let surface = VideoSurface::new();
        let frame = CameraFrame::packed(1, 1, PixelFormat::Gray8, vec![0]);

        surface.publish(frame.clone());
        assert!(surface.latest_frame().is_none());

        surface.attach(&CameraDevice::new("/dev/video0", "Webcam"));
        surface.publish(frame);
        assert_eq!(surface.frames_published(), 1);
        assert!(surface.latest_frame().is_some());

        surface.detach();
        surface.detach();
        assert!(!surface.is_attached());
        assert!(surface.latest_frame().is_none());
    }
}
