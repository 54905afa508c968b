// SPDX-License-Identifier: MPL-2.0

//! Error types for the capture workflows
//!
//! Every error that reaches the user is turned into a result fragment by the
//! workflow that produced it. The `Display` text of the user-facing variants
//! is the message shown in that fragment.

use crate::constants::{limits, messages};
use thiserror::Error;

/// Camera acquisition errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeviceError {
    /// The user or the system refused access to the camera
    #[error("{}", messages::CAMERA_ACCESS_DENIED)]
    PermissionDenied,
    /// No video input device is present
    #[error("No camera devices found")]
    NoCameraFound,
    /// The device exists but could not be opened or configured
    #[error("{}", messages::CAMERA_ACCESS_DENIED)]
    InitializationFailed(String),
    /// Device enumeration itself failed
    #[error("Camera enumeration failed: {0}")]
    EnumerationFailed(String),
    /// The platform has no camera support at all
    #[error("Camera not supported on this device")]
    Unsupported,
    /// The stream ended or kept failing while a capture was running
    #[error("{}", messages::CAMERA_STREAM_LOST)]
    StreamLost(String),
}

impl DeviceError {
    /// Message for the device error fragment
    ///
    /// `init_failed` is the workflow's own text for a setup failure that is
    /// not about the camera itself.
    pub fn user_message(&self, init_failed: &str) -> String {
        match self {
            DeviceError::PermissionDenied
            | DeviceError::NoCameraFound
            | DeviceError::InitializationFailed(_) => messages::CAMERA_ACCESS_DENIED.to_string(),
            DeviceError::EnumerationFailed(_) => init_failed.to_string(),
            DeviceError::Unsupported | DeviceError::StreamLost(_) => self.to_string(),
        }
    }
}

/// Per-frame decode errors
///
/// `NotFound` is the normal outcome for most frames and is never logged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// No barcode in this frame
    #[error("No barcode found in frame")]
    NotFound,
    /// A barcode was located but its checksum did not verify
    #[error("Checksum mismatch: {0}")]
    Checksum(String),
    /// A barcode was located but could not be read
    #[error("Unreadable barcode: {0}")]
    Format(String),
    /// The frame could not be prepared for decoding
    #[error("Frame preparation failed: {0}")]
    Frame(String),
}

impl DecodeError {
    /// Check if this is the quiet "nothing here" outcome
    pub fn is_not_found(&self) -> bool {
        matches!(self, DecodeError::NotFound)
    }
}

/// Submission errors
///
/// The message is what the user sees. Transport causes are logged where they
/// happen and never carried in here.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServerError {
    /// The server answered with an `error` field
    #[error("{0}")]
    Application(String),
    /// The request never completed or the reply was not JSON
    #[error("{0}")]
    Transport(String),
}

impl ServerError {
    /// User-facing message for this error
    pub fn message(&self) -> &str {
        match self {
            ServerError::Application(msg) | ServerError::Transport(msg) => msg,
        }
    }
}

/// Client-side validation of manual input
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Manually typed barcode shorter than the minimum
    #[error("Please enter a valid barcode (at least {min} digits)")]
    BarcodeTooShort { min: usize },
    /// Manual food search shorter than the minimum
    #[error("Please enter at least {min} characters to search")]
    SearchTooShort { min: usize },
}

/// Construction-time errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InitError {
    /// The decoder was configured without any barcode format
    #[error("No barcode formats configured")]
    NoFormats,
    /// The decoder was configured with an invalid frame size limit
    #[error("Invalid decode dimension: {0}")]
    InvalidDimension(u32),
    /// The HTTP client could not be built
    #[error("Failed to create HTTP client: {0}")]
    HttpClient(String),
    /// The server base URL is not usable
    #[error("Invalid server URL: {0}")]
    InvalidServerUrl(String),
}

/// Configuration file errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file exists but could not be read or written
    #[error("Config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// The file is not valid configuration JSON
    #[error("Invalid config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Validate a manually entered barcode
///
/// Returns the trimmed code.
pub fn validate_manual_barcode(input: &str) -> Result<&str, ValidationError> {
    let code = input.trim();
    if code.chars().count() < limits::MIN_BARCODE_LENGTH {
        return Err(ValidationError::BarcodeTooShort {
            min: limits::MIN_BARCODE_LENGTH,
        });
    }
    Ok(code)
}

/// Validate a manually entered food search query
///
/// Returns the trimmed query.
pub fn validate_manual_search(input: &str) -> Result<&str, ValidationError> {
    let query = input.trim();
    if query.chars().count() < limits::MIN_SEARCH_LENGTH {
        return Err(ValidationError::SearchTooShort {
            min: limits::MIN_SEARCH_LENGTH,
        });
    }
    Ok(query)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_barcode_too_short() {
        let err = validate_manual_barcode(" 1234567 ").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Please enter a valid barcode (at least 8 digits)"
        );
    }

    #[test]
    fn test_manual_barcode_trimmed() {
        assert_eq!(validate_manual_barcode("  12345678\n").unwrap(), "12345678");
    }

    #[test]
    fn test_manual_search_single_char() {
        let err = validate_manual_search("a").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Please enter at least 2 characters to search"
        );
    }

    #[test]
    fn test_search_whitespace_does_not_count() {
        assert!(validate_manual_search("  b  ").is_err());
        assert_eq!(validate_manual_search(" rice ").unwrap(), "rice");
    }

    #[test]
    fn test_device_error_user_messages() {
        // Missing hardware reads the same as a refused permission
        assert_eq!(
            DeviceError::NoCameraFound.user_message(messages::SCANNER_INIT_FAILED),
            messages::CAMERA_ACCESS_DENIED
        );
        let enumeration = DeviceError::EnumerationFailed("udev".into());
        assert_eq!(
            enumeration.user_message(messages::SCANNER_INIT_FAILED),
            messages::SCANNER_INIT_FAILED
        );
        assert_eq!(
            enumeration.user_message(messages::CAMERA_INIT_FAILED),
            messages::CAMERA_INIT_FAILED
        );
        assert_eq!(
            DeviceError::StreamLost("unplugged".into()).user_message(messages::CAMERA_INIT_FAILED),
            messages::CAMERA_STREAM_LOST
        );
    }

    #[test]
    fn test_server_error_message() {
        let err = ServerError::Application("Product not found".into());
        assert_eq!(err.message(), "Product not found");
        assert_eq!(err.to_string(), "Product not found");
    }

    #[test]
    fn test_not_found_is_quiet() {
        assert!(DecodeError::NotFound.is_not_found());
        assert!(!DecodeError::Checksum("ean13".into()).is_not_found());
    }
}
