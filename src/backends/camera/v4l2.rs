// SPDX-License-Identifier: GPL-3.0-only

//! Direct V4L2 camera capture
//!
//! Uses the v4l crate to enumerate `/dev/video*` capture nodes and stream
//! frames through memory-mapped buffers. YUYV is requested first since
//! every UVC webcam offers it; MJPEG is accepted when the driver insists and
//! decoded to RGBA on the capture thread.

use super::types::*;
use super::{CameraBackend, CameraStream};
use crate::constants::capture;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};
use v4l::FourCC;
use v4l::buffer::Type;
use v4l::io::traits::CaptureStream;
use v4l::prelude::*;
use v4l::video::Capture;

const FOURCC_YUYV: &[u8; 4] = b"YUYV";
const FOURCC_MJPG: &[u8; 4] = b"MJPG";

/// V4L2 camera backend
#[derive(Debug, Default)]
pub struct V4l2Backend;

impl V4l2Backend {
    pub fn new() -> Self {
        Self
    }
}

impl CameraBackend for V4l2Backend {
    fn is_available(&self) -> bool {
        !v4l::context::enum_devices().is_empty()
    }

    fn enumerate_cameras(&self) -> BackendResult<Vec<CameraDevice>> {
        let mut cameras = Vec::new();

        for node in v4l::context::enum_devices() {
            let path = node.path().to_string_lossy().to_string();

            // Metadata nodes of UVC cameras expose no video formats
            let dev = match Device::with_path(node.path()) {
                Ok(dev) => dev,
                Err(e) => {
                    if e.kind() == std::io::ErrorKind::PermissionDenied {
                        return Err(BackendError::PermissionDenied(format!("{}: {}", path, e)));
                    }
                    debug!(path = %path, error = %e, "Skipping unreadable video node");
                    continue;
                }
            };
            let has_formats = dev
                .enum_formats()
                .map(|formats| !formats.is_empty())
                .unwrap_or(false);
            if !has_formats {
                debug!(path = %path, "Skipping video node without capture formats");
                continue;
            }

            let label = node
                .name()
                .unwrap_or_else(|| format!("Camera {}", node.index()));
            cameras.push(CameraDevice::new(path, label));
        }

        debug!(count = cameras.len(), "Enumerated V4L2 cameras");
        Ok(cameras)
    }

    fn open(
        &self,
        device: &CameraDevice,
        constraints: &StreamConstraints,
    ) -> BackendResult<Box<dyn CameraStream>> {
        info!(device = %device, "Opening V4L2 device");

        let dev = Device::with_path(&device.id)
            .map_err(|e| BackendError::from_open_error(&device.id, &e))?;

        let mut format = dev
            .format()
            .map_err(|e| BackendError::InitializationFailed(format!("Failed to query format: {}", e)))?;
        format.width = constraints.ideal_width;
        format.height = constraints.ideal_height;
        format.fourcc = FourCC::new(FOURCC_YUYV);

        // The driver answers with the closest format it supports
        let format = match dev.set_format(&format) {
            Ok(f) => f,
            Err(e) => {
                warn!(error = %e, "Could not set format, using current device format");
                dev.format().map_err(|e| {
                    BackendError::InitializationFailed(format!("Failed to query format: {}", e))
                })?
            }
        };

        let encoding = if format.fourcc == FourCC::new(FOURCC_YUYV) {
            StreamEncoding::Yuyv
        } else if format.fourcc == FourCC::new(FOURCC_MJPG) {
            StreamEncoding::Mjpeg
        } else {
            return Err(BackendError::FormatNotSupported(format!(
                "{} offers {}",
                device.label, format.fourcc
            )));
        };

        info!(
            width = format.width,
            height = format.height,
            fourcc = %format.fourcc,
            "Negotiated V4L2 format"
        );

        let stream = MmapStream::with_buffers(&dev, Type::VideoCapture, capture::V4L2_BUFFER_COUNT)
            .map_err(|e| {
                BackendError::InitializationFailed(format!("Failed to create buffer stream: {}", e))
            })?;

        let stride = if format.stride > 0 {
            format.stride
        } else {
            format.width * 2
        };

        Ok(Box::new(V4l2Stream {
            device: device.clone(),
            stream: Some(stream),
            width: format.width,
            height: format.height,
            stride,
            encoding,
        }))
    }

    fn backend_type(&self) -> CameraBackendType {
        CameraBackendType::V4l2
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StreamEncoding {
    Yuyv,
    Mjpeg,
}

/// Memory-mapped capture stream
///
/// Dropping the inner stream turns streaming off and closes the device.
struct V4l2Stream {
    device: CameraDevice,
    stream: Option<MmapStream<'static>>,
    width: u32,
    height: u32,
    stride: u32,
    encoding: StreamEncoding,
}

impl CameraStream for V4l2Stream {
    fn device(&self) -> &CameraDevice {
        &self.device
    }

    fn next_frame(&mut self) -> BackendResult<CameraFrame> {
        let stream = self.stream.as_mut().ok_or(BackendError::StreamStopped)?;
        let captured_at = Instant::now();

        let (buf, meta) = stream
            .next()
            .map_err(|e| BackendError::IoError(format!("Failed to dequeue frame: {}", e)))?;
        let used = (meta.bytesused as usize).min(buf.len());
        let bytes = &buf[..used];

        match self.encoding {
            StreamEncoding::Yuyv => Ok(CameraFrame {
                width: self.width,
                height: self.height,
                data: Arc::from(bytes),
                format: PixelFormat::YUYV,
                stride: self.stride,
                captured_at,
            }),
            StreamEncoding::Mjpeg => {
                let rgba = image::load_from_memory_with_format(bytes, image::ImageFormat::Jpeg)
                    .map_err(|e| BackendError::IoError(format!("Corrupt MJPEG frame: {}", e)))?
                    .to_rgba8();
                let (width, height) = rgba.dimensions();
                Ok(CameraFrame {
                    width,
                    height,
                    data: Arc::from(rgba.into_raw().into_boxed_slice()),
                    format: PixelFormat::RGBA,
                    stride: width * 4,
                    captured_at,
                })
            }
        }
    }

    fn stop(&mut self) {
        if self.stream.take().is_some() {
            info!(device = %self.device, "V4L2 stream stopped");
        }
    }

    fn is_active(&self) -> bool {
        self.stream.is_some()
    }
}

impl Drop for V4l2Stream {
    fn drop(&mut self) {
        self.stop();
    }
}
