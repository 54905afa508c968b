// SPDX-License-Identifier: MPL-2.0

//! Recognition snapshot pipeline
//!
//! ```text
//! Live stream → Capture (stream stopped) → Encode JPEG → upload / disk
//! ```
//!
//! Capture and encoding run on the blocking pool so the async workflow
//! stays responsive.

pub mod capture;
pub mod encoding;

pub use capture::PhotoCapture;
pub use encoding::{EncodedImage, PhotoEncoder};

use crate::backends::camera::CameraStream;
use crate::capture::surface::VideoSurface;

/// Snapshot pipeline: one frame in, one JPEG out
#[derive(Debug, Clone, Copy, Default)]
pub struct PhotoPipeline {
    encoder: PhotoEncoder,
}

impl PhotoPipeline {
    pub fn new(encoder: PhotoEncoder) -> Self {
        Self { encoder }
    }

    pub fn encoder(&self) -> &PhotoEncoder {
        &self.encoder
    }

    /// Snapshot the stream, stop it, and encode the frame
    pub async fn capture_and_encode(
        &self,
        stream: Box<dyn CameraStream>,
        surface: VideoSurface,
    ) -> Result<EncodedImage, String> {
        let frame = PhotoCapture::capture_and_release(stream, surface).await?;
        self.encoder.encode(frame).await
    }
}
