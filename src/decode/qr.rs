// SPDX-License-Identifier: GPL-3.0-only

//! QR code decoding with rqrr

use super::BarcodeDecoder;
use super::luma::LumaImage;
use crate::errors::DecodeError;
use tracing::debug;

/// QR decoder
///
/// Returns the first grid that decodes; grids that are found but fail to
/// decode are reported only when nothing else in the frame succeeds.
#[derive(Debug, Default, Clone, Copy)]
pub struct QrDecoder;

impl BarcodeDecoder for QrDecoder {
    fn decode(&self, image: &LumaImage) -> Result<String, DecodeError> {
        let width = image.width as usize;
        let height = image.height as usize;
        let mut prepared =
            rqrr::PreparedImage::prepare_from_greyscale(width, height, |x, y| image.get(x, y));

        let grids = prepared.detect_grids();
        if grids.is_empty() {
            return Err(DecodeError::NotFound);
        }

        let mut last_error = None;
        for grid in grids {
            match grid.decode() {
                Ok((_meta, content)) => {
                    debug!(len = content.len(), "Decoded QR code");
                    return Ok(content);
                }
                Err(e) => last_error = Some(e),
            }
        }

        Err(match last_error {
            Some(rqrr::DeQRError::DataEcc) | Some(rqrr::DeQRError::FormatEcc) => {
                DecodeError::Checksum("qr".to_string())
            }
            Some(e) => DecodeError::Format(format!("qr: {}", e)),
            None => DecodeError::NotFound,
        })
    }

    fn name(&self) -> &'static str {
        "qr"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_image_has_no_code() {
        let image = LumaImage::new(64, 64, vec![255; 64 * 64]);
        assert_eq!(QrDecoder.decode(&image), Err(DecodeError::NotFound));
    }
}
