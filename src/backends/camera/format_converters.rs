// SPDX-License-Identifier: GPL-3.0-only
//! Pixel format conversion for camera frames
//!
//! Frames reach the capture workflows in whatever layout the device
//! produced. Photo encoding needs packed RGB; these helpers get it there
//! while dropping any row padding.

use super::types::{CameraFrame, PixelFormat};
use image::RgbImage;

/// Convert YUYV (YUV 4:2:2) to RGBA
///
/// YUYV format: Y0 U0 Y1 V0 - each 4-byte group encodes 2 pixels.
/// Uses BT.601 coefficients for YUV to RGB conversion.
pub fn yuyv_to_rgba(data: &[u8], width: u32, height: u32, stride: u32) -> Vec<u8> {
    let width = width as usize;
    let height = height as usize;
    let stride = stride as usize;
    let mut rgba = Vec::with_capacity(width * height * 4);

    for row in 0..height {
        let start = row * stride;
        let end = (start + width * 2).min(data.len());
        if start >= end {
            break;
        }

        let mut written = 0;
        for chunk in data[start..end].chunks_exact(4) {
            let y0 = chunk[0] as f32;
            let u = chunk[1] as f32 - 128.0;
            let y1 = chunk[2] as f32;
            let v = chunk[3] as f32 - 128.0;

            for y in [y0, y1] {
                if written == width {
                    break;
                }
                rgba.push((y + 1.402 * v).clamp(0.0, 255.0) as u8);
                rgba.push((y - 0.344 * u - 0.714 * v).clamp(0.0, 255.0) as u8);
                rgba.push((y + 1.772 * u).clamp(0.0, 255.0) as u8);
                rgba.push(255);
                written += 1;
            }
        }
    }

    rgba
}

/// Convert any camera frame to a tightly packed RGB image
///
/// Returns `None` when the buffer is shorter than the frame geometry.
pub fn frame_to_rgb_image(frame: &CameraFrame) -> Option<RgbImage> {
    if !frame.is_complete() {
        return None;
    }

    let width = frame.width as usize;
    let height = frame.height as usize;
    let stride = frame.stride as usize;
    let mut rgb = Vec::with_capacity(width * height * 3);

    match frame.format {
        PixelFormat::RGBA => {
            for row in 0..height {
                let line = &frame.data[row * stride..row * stride + width * 4];
                for px in line.chunks_exact(4) {
                    rgb.extend_from_slice(&px[..3]);
                }
            }
        }
        PixelFormat::RGB24 => {
            for row in 0..height {
                rgb.extend_from_slice(&frame.data[row * stride..row * stride + width * 3]);
            }
        }
        PixelFormat::Gray8 => {
            for row in 0..height {
                for &luma in &frame.data[row * stride..row * stride + width] {
                    rgb.extend_from_slice(&[luma, luma, luma]);
                }
            }
        }
        PixelFormat::YUYV => {
            let rgba = yuyv_to_rgba(&frame.data, frame.width, frame.height, frame.stride);
            for px in rgba.chunks_exact(4) {
                rgb.extend_from_slice(&px[..3]);
            }
        }
    }

    RgbImage::from_raw(frame.width, frame.height, rgb)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_yuyv_grey_is_neutral() {
        // Two rows of two pixels, Y=128 with neutral chroma, 2 bytes padding
        let data = vec![128, 128, 128, 128, 0, 0, 128, 128, 128, 128, 0, 0];
        let rgba = yuyv_to_rgba(&data, 2, 2, 6);
        assert_eq!(rgba.len(), 16);
        for px in rgba.chunks_exact(4) {
            assert_eq!(px, &[128, 128, 128, 255]);
        }
    }

    #[test]
    fn test_rgba_frame_drops_alpha_and_padding() {
        let data: Vec<u8> = vec![
            255, 0, 0, 255, 0, 255, 0, 255, 9, 9, // row 0 + padding
            0, 0, 255, 255, 1, 2, 3, 255, 9, 9, // row 1 + padding
        ];
        let frame = CameraFrame {
            width: 2,
            height: 2,
            data: Arc::from(data.as_slice()),
            format: PixelFormat::RGBA,
            stride: 10,
            captured_at: std::time::Instant::now(),
        };

        let img = frame_to_rgb_image(&frame).unwrap();
        assert_eq!(img.dimensions(), (2, 2));
        assert_eq!(img.get_pixel(0, 0).0, [255, 0, 0]);
        assert_eq!(img.get_pixel(1, 1).0, [1, 2, 3]);
    }

    #[test]
    fn test_truncated_frame_is_rejected() {
        let frame = CameraFrame::packed(4, 4, PixelFormat::Gray8, vec![0; 8]);
        assert!(frame_to_rgb_image(&frame).is_none());
    }
}
