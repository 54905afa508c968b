// SPDX-License-Identifier: GPL-3.0-only

//! One-dimensional retail barcodes with rxing
//!
//! rxing searches the frame for every symbology it knows. Results in a
//! format outside the configured set are treated as "nothing found".

use super::luma::LumaImage;
use super::{BarcodeDecoder, BarcodeFormat};
use crate::errors::DecodeError;
use rxing::Exceptions;
use tracing::{debug, trace};

/// EAN / UPC / Code 128 decoder
#[derive(Debug, Clone)]
pub struct LinearDecoder {
    formats: Vec<BarcodeFormat>,
}

impl LinearDecoder {
    /// Create a decoder for the one-dimensional formats in `formats`
    ///
    /// Returns `None` when the set contains no one-dimensional format.
    pub fn new(formats: &[BarcodeFormat]) -> Option<Self> {
        let formats: Vec<BarcodeFormat> = formats
            .iter()
            .copied()
            .filter(|f| f.is_linear())
            .collect();
        if formats.is_empty() {
            None
        } else {
            Some(Self { formats })
        }
    }

    pub fn formats(&self) -> &[BarcodeFormat] {
        &self.formats
    }
}

impl BarcodeDecoder for LinearDecoder {
    fn decode(&self, image: &LumaImage) -> Result<String, DecodeError> {
        let result = rxing::helpers::detect_in_luma(
            image.data.clone(),
            image.width,
            image.height,
            None,
        )
        .map_err(map_exception)?;

        let Some(format) = BarcodeFormat::from_rxing(result.getBarcodeFormat()) else {
            trace!(format = ?result.getBarcodeFormat(), "Ignoring unsupported symbology");
            return Err(DecodeError::NotFound);
        };
        if !self.formats.contains(&format) {
            trace!(%format, "Ignoring symbology outside configured set");
            return Err(DecodeError::NotFound);
        }

        debug!(%format, "Decoded linear barcode");
        Ok(result.getText().to_string())
    }

    fn name(&self) -> &'static str {
        "linear"
    }
}

fn map_exception(err: Exceptions) -> DecodeError {
    match err {
        Exceptions::NotFoundException(_) => DecodeError::NotFound,
        Exceptions::ChecksumException(_) => DecodeError::Checksum(err.to_string()),
        Exceptions::FormatException(_) => DecodeError::Format(err.to_string()),
        other => DecodeError::Format(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_qr_only_set_has_no_linear_decoder() {
        assert!(LinearDecoder::new(&[BarcodeFormat::Qr]).is_none());
    }

    #[test]
    fn test_keeps_only_linear_formats() {
        let decoder =
            LinearDecoder::new(&[BarcodeFormat::Qr, BarcodeFormat::Ean13, BarcodeFormat::UpcA])
                .unwrap();
        assert_eq!(
            decoder.formats(),
            &[BarcodeFormat::Ean13, BarcodeFormat::UpcA]
        );
    }

    #[test]
    fn test_blank_image_is_quiet() {
        let decoder = LinearDecoder::new(&BarcodeFormat::RETAIL).unwrap();
        let image = LumaImage::new(120, 40, vec![255; 120 * 40]);
        assert_eq!(decoder.decode(&image), Err(DecodeError::NotFound));
    }
}
