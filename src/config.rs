// SPDX-License-Identifier: GPL-3.0-only

use crate::backends::camera::{CameraBackendType, FacingMode, StreamConstraints};
use crate::capture::HandoffMode;
use crate::constants::{capture, endpoints, limits, timing};
use crate::decode::BarcodeFormat;
use crate::errors::ConfigError;
use crate::pipelines::photo::PhotoEncoder;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// Application configuration
///
/// Stored as JSON. Missing keys take their default, so older files keep
/// working when fields are added.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the nutrition server
    pub server_url: String,
    /// How results reach the food log
    pub handoff_mode: HandoffMode,
    /// Camera backend to use
    pub backend: CameraBackendType,
    /// Preferred camera direction
    pub facing: FacingMode,
    /// Ideal capture width
    pub capture_width: u32,
    /// Ideal capture height
    pub capture_height: u32,
    /// JPEG quality of recognition uploads (1-100)
    pub jpeg_quality: u8,
    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,
    /// Recognition captures before falling back to manual search
    pub max_recognition_attempts: u32,
    /// Longest frame side handed to the barcode decoders
    pub decode_max_dimension: u32,
    /// Barcode symbologies to scan for
    pub barcode_formats: Vec<BarcodeFormat>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_url: endpoints::DEFAULT_SERVER_URL.to_string(),
            handoff_mode: HandoffMode::default(),
            backend: CameraBackendType::default(),
            facing: FacingMode::default(),
            capture_width: capture::IDEAL_WIDTH,
            capture_height: capture::IDEAL_HEIGHT,
            jpeg_quality: capture::JPEG_QUALITY,
            request_timeout_secs: timing::REQUEST_TIMEOUT.as_secs(),
            max_recognition_attempts: limits::MAX_RECOGNITION_ATTEMPTS,
            decode_max_dimension: capture::DECODE_MAX_DIMENSION,
            barcode_formats: BarcodeFormat::RETAIL.to_vec(),
        }
    }
}

impl Config {
    /// `$XDG_CONFIG_HOME/nutricam/config.json`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("nutricam").join("config.json"))
    }

    /// Load from the default location, falling back to defaults
    pub fn load() -> Result<Self, ConfigError> {
        match Self::default_path() {
            Some(path) => Self::load_from(&path),
            None => {
                debug!("No config directory, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Load from a file; a missing file yields the defaults
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "Config file not found, using defaults");
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Io {
                    path: path.display().to_string(),
                    source,
                });
            }
        };

        let config = serde_json::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })?;
        info!(path = %path.display(), "Loaded config");
        Ok(config)
    }

    /// Write as pretty JSON, creating parent directories
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let io_error = |source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(io_error)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })?;
        std::fs::write(path, json).map_err(io_error)
    }

    /// Capability hint for opening cameras
    pub fn stream_constraints(&self) -> StreamConstraints {
        StreamConstraints {
            ideal_width: self.capture_width,
            ideal_height: self.capture_height,
            facing: self.facing,
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    /// Encoder for recognition uploads, bounded by the capture size
    pub fn photo_encoder(&self) -> PhotoEncoder {
        PhotoEncoder::new(self.jpeg_quality, self.capture_width, self.capture_height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config: Config =
            serde_json::from_str(r#"{"server_url": "http://10.0.0.2:5000", "handoff_mode": "in_page"}"#)
                .unwrap();
        assert_eq!(config.server_url, "http://10.0.0.2:5000");
        assert_eq!(config.handoff_mode, HandoffMode::InPage);
        assert_eq!(config.jpeg_quality, 80);
        assert_eq!(config.barcode_formats, BarcodeFormat::RETAIL.to_vec());
    }

    #[test]
    fn test_constraints_from_config() {
        let constraints = Config::default().stream_constraints();
        assert_eq!((constraints.ideal_width, constraints.ideal_height), (640, 480));
        assert_eq!(constraints.facing, FacingMode::Environment);
    }

    #[test]
    fn test_zero_timeout_is_clamped() {
        let config = Config {
            request_timeout_secs: 0,
            ..Config::default()
        };
        assert_eq!(config.request_timeout(), Duration::from_secs(1));
    }
}
