// SPDX-License-Identifier: MPL-2.0

//! Snapshot capture from a live stream
//!
//! A recognition capture takes exactly one frame and then stops the stream,
//! whether or not the frame could be read.

use crate::backends::camera::CameraStream;
use crate::backends::camera::types::CameraFrame;
use crate::capture::surface::VideoSurface;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Snapshot handler
pub struct PhotoCapture;

impl PhotoCapture {
    /// Pull one frame from the stream
    pub fn capture_from_stream(stream: &mut dyn CameraStream) -> Result<Arc<CameraFrame>, String> {
        let frame = stream
            .next_frame()
            .map_err(|e| format!("Failed to capture photo: {}", e))?;

        debug!(
            width = frame.width,
            height = frame.height,
            format = ?frame.format,
            "Frame captured from stream"
        );

        Ok(Arc::new(frame))
    }

    /// Take a snapshot and stop the stream
    ///
    /// Falls back to the last frame shown on the surface when the stream
    /// fails to deliver one. The surface is detached either way.
    pub async fn capture_and_release(
        mut stream: Box<dyn CameraStream>,
        surface: VideoSurface,
    ) -> Result<Arc<CameraFrame>, String> {
        info!(device = %stream.device(), "Capturing snapshot");

        let joined = tokio::task::spawn_blocking(move || {
            let captured = Self::capture_from_stream(stream.as_mut());
            stream.stop();
            let fallback = surface.latest_frame();
            surface.detach();
            (captured, fallback)
        })
        .await
        .map_err(|e| format!("Capture task error: {}", e))?;

        match joined {
            (Ok(frame), _) => Ok(frame),
            (Err(e), Some(frame)) => {
                warn!(error = %e, "Stream capture failed, using last preview frame");
                Ok(Arc::new(frame))
            }
            (Err(e), None) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::camera::types::{BackendError, BackendResult, CameraDevice, PixelFormat};

    struct OneShotStream {
        device: CameraDevice,
        frames: Vec<CameraFrame>,
        active: bool,
    }

    impl CameraStream for OneShotStream {
        fn device(&self) -> &CameraDevice {
            &self.device
        }

        fn next_frame(&mut self) -> BackendResult<CameraFrame> {
            self.frames.pop().ok_or(BackendError::IoError("no frame".into()))
        }

        fn stop(&mut self) {
            self.active = false;
        }

        fn is_active(&self) -> bool {
            self.active
        }
    }

    fn device() -> CameraDevice {
        CameraDevice::new("/dev/video0", "Rear Camera")
    }

    #[tokio::test]
    async fn test_capture_detaches_surface() {
        let surface = VideoSurface::new();
        surface.attach(&device());
        let stream = Box::new(OneShotStream {
            device: device(),
            frames: vec![CameraFrame::packed(2, 2, PixelFormat::Gray8, vec![1; 4])],
            active: true,
        });

        let frame = PhotoCapture::capture_and_release(stream, surface.clone())
            .await
            .unwrap();
        assert_eq!(frame.width, 2);
        assert!(!surface.is_attached());
    }

    #[tokio::test]
    async fn test_falls_back_to_preview_frame() {
        let surface = VideoSurface::new();
        surface.attach(&device());
        surface.publish(CameraFrame::packed(3, 1, PixelFormat::Gray8, vec![9; 3]));
        let stream = Box::new(OneShotStream {
            device: device(),
            frames: Vec::new(),
            active: true,
        });

        let frame = PhotoCapture::capture_and_release(stream, surface).await.unwrap();
        assert_eq!(frame.width, 3);
    }

    #[tokio::test]
    async fn test_no_frame_at_all_is_error() {
        let stream = Box::new(OneShotStream {
            device: device(),
            frames: Vec::new(),
            active: true,
        });
        assert!(
            PhotoCapture::capture_and_release(stream, VideoSurface::new())
                .await
                .is_err()
        );
    }
}
