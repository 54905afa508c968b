// SPDX-License-Identifier: GPL-3.0-only

//! Capture-and-handoff workflows
//!
//! ```text
//! DeviceAcquirer → capture (decode loop / snapshot) → FoodApi → ResultPanel
//!        └────────────── CaptureSession::release on every exit ──────────┘
//! ```
//!
//! [`BarcodeScanner`] and [`FoodRecognizer`] are the two instances. Each owns
//! at most one [`CaptureSession`] at a time.

pub mod acquirer;
pub mod barcode;
pub mod handoff;
pub mod recognition;
pub mod session;
pub mod surface;

pub use acquirer::DeviceAcquirer;
pub use barcode::BarcodeScanner;
pub use handoff::{Handoff, HandoffAction, HandoffMode, HandoffTarget};
pub use recognition::FoodRecognizer;
pub use session::{CaptureSession, SessionSlot, SubmissionSlot};
pub use surface::VideoSurface;

use crate::errors::ServerError;

/// Outcome of one capture
#[derive(Debug, Clone, PartialEq)]
pub enum CaptureResult<T> {
    Found(T),
    NotFound,
    DeviceError(String),
    ServerError(String),
}

impl<T> CaptureResult<T> {
    /// Wrap a server response
    pub fn from_response(response: Result<T, ServerError>) -> Self {
        match response {
            Ok(payload) => CaptureResult::Found(payload),
            Err(e) => CaptureResult::ServerError(e.message().to_string()),
        }
    }

    pub fn found(&self) -> Option<&T> {
        match self {
            CaptureResult::Found(payload) => Some(payload),
            _ => None,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, CaptureResult::Found(_))
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> CaptureResult<U> {
        match self {
            CaptureResult::Found(payload) => CaptureResult::Found(f(payload)),
            CaptureResult::NotFound => CaptureResult::NotFound,
            CaptureResult::DeviceError(msg) => CaptureResult::DeviceError(msg),
            CaptureResult::ServerError(msg) => CaptureResult::ServerError(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_response() {
        let ok: CaptureResult<u8> = CaptureResult::from_response(Ok(3));
        assert_eq!(ok.found(), Some(&3));

        let err: CaptureResult<u8> = CaptureResult::from_response(Err(
            ServerError::Application("No barcode provided".into()),
        ));
        assert_eq!(
            err,
            CaptureResult::ServerError("No barcode provided".to_string())
        );
        assert!(!err.is_found());
    }
}
