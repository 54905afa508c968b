// SPDX-License-Identifier: GPL-3.0-only

//! Barcode decoding
//!
//! Decoding is delegated to bundled crates: rxing for one-dimensional retail
//! symbologies and rqrr for QR codes. [`MultiFormatReader`] combines them
//! behind the [`BarcodeDecoder`] trait, and [`DecodeLoop`] runs a decoder
//! continuously against a live camera stream.

pub mod linear;
pub mod luma;
pub mod qr;
pub mod scan_loop;

pub use luma::LumaImage;
pub use scan_loop::{DecodeLoop, DecodeLoopHandle, ScanOutcome};

use crate::errors::{DecodeError, InitError};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Barcode symbologies the scanner can be configured for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BarcodeFormat {
    Ean13,
    Ean8,
    UpcA,
    UpcE,
    Code128,
    Qr,
}

impl BarcodeFormat {
    /// Formats found on retail food packaging
    pub const RETAIL: [BarcodeFormat; 5] = [
        BarcodeFormat::Ean13,
        BarcodeFormat::Ean8,
        BarcodeFormat::UpcA,
        BarcodeFormat::UpcE,
        BarcodeFormat::Code128,
    ];

    /// Check if this is a one-dimensional symbology
    pub fn is_linear(&self) -> bool {
        !matches!(self, BarcodeFormat::Qr)
    }

    /// Map an rxing format onto ours
    pub fn from_rxing(format: &rxing::BarcodeFormat) -> Option<Self> {
        match format {
            rxing::BarcodeFormat::EAN_13 => Some(BarcodeFormat::Ean13),
            rxing::BarcodeFormat::EAN_8 => Some(BarcodeFormat::Ean8),
            rxing::BarcodeFormat::UPC_A => Some(BarcodeFormat::UpcA),
            rxing::BarcodeFormat::UPC_E => Some(BarcodeFormat::UpcE),
            rxing::BarcodeFormat::CODE_128 => Some(BarcodeFormat::Code128),
            rxing::BarcodeFormat::QR_CODE => Some(BarcodeFormat::Qr),
            _ => None,
        }
    }
}

impl std::fmt::Display for BarcodeFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            BarcodeFormat::Ean13 => "EAN-13",
            BarcodeFormat::Ean8 => "EAN-8",
            BarcodeFormat::UpcA => "UPC-A",
            BarcodeFormat::UpcE => "UPC-E",
            BarcodeFormat::Code128 => "Code 128",
            BarcodeFormat::Qr => "QR",
        };
        write!(f, "{}", name)
    }
}

/// A barcode decoder working on greyscale images
///
/// `DecodeError::NotFound` is the expected result for most frames.
pub trait BarcodeDecoder: Send + Sync {
    /// Decode the first barcode in the image
    fn decode(&self, image: &LumaImage) -> Result<String, DecodeError>;

    /// Short name used in log output
    fn name(&self) -> &'static str {
        "decoder"
    }
}

/// Decoder trying every configured symbology
pub struct MultiFormatReader {
    decoders: Vec<Box<dyn BarcodeDecoder>>,
    formats: Vec<BarcodeFormat>,
    max_dimension: u32,
}

impl std::fmt::Debug for MultiFormatReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MultiFormatReader")
            .field("formats", &self.formats)
            .field("max_dimension", &self.max_dimension)
            .finish()
    }
}

impl MultiFormatReader {
    /// Build a reader for the given formats
    ///
    /// Frames are downscaled so their longest side is at most
    /// `max_dimension` before decoding.
    pub fn new(formats: &[BarcodeFormat], max_dimension: u32) -> Result<Self, InitError> {
        if formats.is_empty() {
            return Err(InitError::NoFormats);
        }
        if max_dimension == 0 {
            return Err(InitError::InvalidDimension(max_dimension));
        }

        let mut decoders: Vec<Box<dyn BarcodeDecoder>> = Vec::new();
        if let Some(linear) = linear::LinearDecoder::new(formats) {
            decoders.push(Box::new(linear));
        }
        if formats.contains(&BarcodeFormat::Qr) {
            decoders.push(Box::new(qr::QrDecoder));
        }

        debug!(?formats, max_dimension, "Barcode reader initialized");

        Ok(Self {
            decoders,
            formats: formats.to_vec(),
            max_dimension,
        })
    }

    pub fn formats(&self) -> &[BarcodeFormat] {
        &self.formats
    }

    pub fn max_dimension(&self) -> u32 {
        self.max_dimension
    }
}

impl BarcodeDecoder for MultiFormatReader {
    fn decode(&self, image: &LumaImage) -> Result<String, DecodeError> {
        let mut failure = DecodeError::NotFound;
        for decoder in &self.decoders {
            match decoder.decode(image) {
                Ok(code) => return Ok(code),
                Err(DecodeError::NotFound) => {}
                Err(e) => failure = e,
            }
        }
        Err(failure)
    }

    fn name(&self) -> &'static str {
        "multi-format"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_format_set_is_init_error() {
        assert_eq!(
            MultiFormatReader::new(&[], 640).unwrap_err(),
            InitError::NoFormats
        );
    }

    #[test]
    fn test_zero_dimension_is_init_error() {
        assert_eq!(
            MultiFormatReader::new(&BarcodeFormat::RETAIL, 0).unwrap_err(),
            InitError::InvalidDimension(0)
        );
    }

    #[test]
    fn test_format_names() {
        assert_eq!(BarcodeFormat::Ean13.to_string(), "EAN-13");
        assert!(!BarcodeFormat::Qr.is_linear());
        let parsed: BarcodeFormat = serde_json::from_str("\"upc_a\"").unwrap();
        assert_eq!(parsed, BarcodeFormat::UpcA);
    }

    #[test]
    fn test_reader_on_blank_frame() {
        let reader =
            MultiFormatReader::new(&[BarcodeFormat::Ean13, BarcodeFormat::Qr], 640).unwrap();
        let image = LumaImage::new(64, 64, vec![255; 64 * 64]);
        assert_eq!(reader.decode(&image), Err(DecodeError::NotFound));
    }
}
