// SPDX-License-Identifier: GPL-3.0-only

//! Greyscale preparation of camera frames
//!
//! Decoders only look at luminance. Frames are reduced to one byte per
//! pixel, stride padding removed, and downscaled so the longest side fits
//! the configured maximum.

use crate::backends::camera::types::{CameraFrame, PixelFormat};
use crate::errors::DecodeError;
use tracing::trace;

/// Tightly packed 8-bit luminance image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LumaImage {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl LumaImage {
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> Self {
        Self {
            width,
            height,
            data,
        }
    }

    /// Luminance at a pixel
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> u8 {
        self.data[y * self.width as usize + x]
    }

    /// Prepare a camera frame for decoding
    pub fn from_frame(frame: &CameraFrame, max_dimension: u32) -> Result<Self, DecodeError> {
        if !frame.is_complete() {
            return Err(DecodeError::Frame(format!(
                "{}x{} {:?} frame with {} bytes",
                frame.width,
                frame.height,
                frame.format,
                frame.data.len()
            )));
        }

        let full = Self::new(frame.width, frame.height, extract_luma(frame));

        if frame.width <= max_dimension && frame.height <= max_dimension {
            return Ok(full);
        }

        let scale = (frame.width as f32 / max_dimension as f32)
            .max(frame.height as f32 / max_dimension as f32);
        let new_width = ((frame.width as f32 / scale) as u32).max(1);
        let new_height = ((frame.height as f32 / scale) as u32).max(1);
        trace!(
            new_width,
            new_height,
            scale,
            "Downscaling frame for decoding"
        );

        Ok(full.downscale(new_width, new_height))
    }

    /// Bilinear downscale
    pub fn downscale(&self, dst_width: u32, dst_height: u32) -> Self {
        let src_width = self.width as usize;
        let src_height = self.height as usize;
        let x_ratio = src_width as f32 / dst_width as f32;
        let y_ratio = src_height as f32 / dst_height as f32;

        let mut data = Vec::with_capacity((dst_width * dst_height) as usize);
        for y in 0..dst_height {
            for x in 0..dst_width {
                let src_x = x as f32 * x_ratio;
                let src_y = y as f32 * y_ratio;

                let x0 = (src_x as usize).min(src_width - 1);
                let y0 = (src_y as usize).min(src_height - 1);
                let x1 = (x0 + 1).min(src_width - 1);
                let y1 = (y0 + 1).min(src_height - 1);
                let x_frac = src_x - x0 as f32;
                let y_frac = src_y - y0 as f32;

                let p00 = self.get(x0, y0) as f32;
                let p01 = self.get(x1, y0) as f32;
                let p10 = self.get(x0, y1) as f32;
                let p11 = self.get(x1, y1) as f32;

                let value = p00 * (1.0 - x_frac) * (1.0 - y_frac)
                    + p01 * x_frac * (1.0 - y_frac)
                    + p10 * (1.0 - x_frac) * y_frac
                    + p11 * x_frac * y_frac;
                data.push(value as u8);
            }
        }

        Self::new(dst_width, dst_height, data)
    }
}

/// BT.601 luma of an RGB triple
#[inline]
fn rgb_luma(r: u8, g: u8, b: u8) -> u8 {
    ((77 * r as u32 + 150 * g as u32 + 29 * b as u32) >> 8) as u8
}

/// Copy luminance without stride padding
fn extract_luma(frame: &CameraFrame) -> Vec<u8> {
    let width = frame.width as usize;
    let height = frame.height as usize;
    let stride = frame.stride as usize;
    let mut luma = Vec::with_capacity(width * height);

    for row in 0..height {
        let start = row * stride;
        match frame.format {
            PixelFormat::Gray8 => luma.extend_from_slice(&frame.data[start..start + width]),
            PixelFormat::RGBA => luma.extend(
                frame.data[start..start + width * 4]
                    .chunks_exact(4)
                    .map(|px| rgb_luma(px[0], px[1], px[2])),
            ),
            PixelFormat::RGB24 => luma.extend(
                frame.data[start..start + width * 3]
                    .chunks_exact(3)
                    .map(|px| rgb_luma(px[0], px[1], px[2])),
            ),
            // Y sits on every even byte
            PixelFormat::YUYV => luma.extend(
                frame.data[start..start + width * 2]
                    .iter()
                    .step_by(2)
                    .copied(),
            ),
        }
    }

    luma
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_rgba_with_stride_padding() {
        let data: Vec<u8> = vec![
            255, 255, 255, 255, // white
            0, 0, 0, 255, // black
            7, 7, // padding
            0, 0, 0, 255, // black
            255, 255, 255, 255, // white
            7, 7, // padding
        ];
        let frame = CameraFrame {
            width: 2,
            height: 2,
            data: Arc::from(data.as_slice()),
            format: PixelFormat::RGBA,
            stride: 10,
            captured_at: std::time::Instant::now(),
        };

        let luma = LumaImage::from_frame(&frame, 640).unwrap();
        assert_eq!(luma.data, vec![255, 0, 0, 255]);
    }

    #[test]
    fn test_yuyv_takes_y_samples() {
        let frame = CameraFrame::packed(2, 1, PixelFormat::YUYV, vec![10, 128, 200, 128]);
        let luma = LumaImage::from_frame(&frame, 640).unwrap();
        assert_eq!(luma.data, vec![10, 200]);
    }

    #[test]
    fn test_large_frame_is_downscaled() {
        let frame = CameraFrame::packed(1280, 720, PixelFormat::Gray8, vec![90; 1280 * 720]);
        let luma = LumaImage::from_frame(&frame, 640).unwrap();
        assert_eq!((luma.width, luma.height), (640, 360));
        assert!(luma.data.iter().all(|&v| v == 90));
    }

    #[test]
    fn test_short_buffer_is_frame_error() {
        let frame = CameraFrame::packed(4, 4, PixelFormat::RGBA, vec![0; 10]);
        assert!(matches!(
            LumaImage::from_frame(&frame, 640),
            Err(DecodeError::Frame(_))
        ));
    }

    #[test]
    fn test_downscale_gradient() {
        let src = LumaImage::new(4, 1, vec![0, 85, 170, 255]);
        let small = src.downscale(2, 1);
        assert!(small.data[0] < 100);
        assert!(small.data[1] > 150);
    }
}
