// SPDX-License-Identifier: GPL-3.0-only

//! Application-wide constants

use std::time::Duration;

/// Server routes
pub mod endpoints {
    /// Barcode lookup (JSON body `{barcode}`)
    pub const SCAN_BARCODE: &str = "/scan-barcode";

    /// Food image recognition (multipart field `image`)
    pub const RECOGNIZE_FOOD: &str = "/recognize-food";

    /// Food name search (query parameter `q`)
    pub const SEARCH_FOOD: &str = "/search-food";

    /// Food log page used by navigation handoffs
    pub const FOOD_LOG: &str = "/food-log";

    /// Query parameter carrying a scanned food id
    pub const SCANNED_FOOD_PARAM: &str = "scanned_food";

    /// Query parameter carrying a food search query
    pub const SEARCH_PARAM: &str = "search";

    /// Multipart field name for the captured image
    pub const IMAGE_FIELD: &str = "image";

    /// File name sent with the captured image
    pub const IMAGE_FILE_NAME: &str = "food-image.jpg";

    /// Default server base URL
    pub const DEFAULT_SERVER_URL: &str = "http://localhost:5000";
}

/// Input and retry limits
pub mod limits {
    /// Minimum length of a manually entered barcode
    pub const MIN_BARCODE_LENGTH: usize = 8;

    /// Minimum length of a manual food search
    pub const MIN_SEARCH_LENGTH: usize = 2;

    /// Recognition captures allowed before falling back to manual search
    pub const MAX_RECOGNITION_ATTEMPTS: u32 = 3;
}

/// Capture defaults
pub mod capture {
    /// Ideal capture width
    pub const IDEAL_WIDTH: u32 = 640;

    /// Ideal capture height
    pub const IDEAL_HEIGHT: u32 = 480;

    /// JPEG quality for recognition snapshots (0-100)
    pub const JPEG_QUALITY: u8 = 80;

    /// Frames are downscaled to this dimension before decoding
    pub const DECODE_MAX_DIMENSION: u32 = 640;

    /// Device label fragments that identify a rear-facing camera
    pub const REAR_CAMERA_HINTS: &[&str] = &["back", "rear"];

    /// Buffers requested from V4L2 devices
    pub const V4L2_BUFFER_COUNT: u32 = 4;
}

/// Timing constants
pub mod timing {
    use super::Duration;

    /// Default HTTP request timeout
    pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

    /// Pause between failed frame reads in the decode loop
    pub const FRAME_RETRY_DELAY: Duration = Duration::from_millis(10);

    /// Failed frame reads in a row after which the camera is considered lost
    pub const MAX_CONSECUTIVE_FRAME_ERRORS: u32 = 50;

    /// Frame counter modulo for periodic logging
    pub const FRAME_LOG_INTERVAL: u64 = 30;

    /// Frame interval of the still image source (~30fps)
    pub const STILL_IMAGE_FRAME_DURATION: Duration = Duration::from_millis(33);
}

/// User-facing messages
pub mod messages {
    pub const CAMERA_ACCESS_DENIED: &str = "Camera access denied or not available. Please ensure you have granted camera permissions.";
    pub const SCANNER_INIT_FAILED: &str = "Failed to initialize barcode scanner. Please try again.";
    pub const CAMERA_INIT_FAILED: &str = "Failed to initialize camera. Please try again.";
    pub const LOOKUP_FAILED: &str = "Failed to look up product. Please try again.";
    pub const ANALYZE_FAILED: &str = "Failed to analyze image. Please try again.";
    pub const SEARCH_FAILED: &str = "Failed to search foods. Please try again.";
    pub const CAPTURE_FAILED: &str = "Failed to capture image. Please try again.";
    pub const CAMERA_STREAM_LOST: &str = "The camera stopped delivering video. Please try again.";
    pub const ATTEMPTS_EXHAUSTED: &str =
        "Unable to recognize food after multiple attempts. Please try manual search.";
    pub const PRODUCT_NOT_FOUND: &str = "No product information was returned for this barcode.";
    pub const FOOD_NOT_RECOGNIZED: &str = "We could not tell what food this is.";
    pub const NO_SEARCH_RESULTS: &str = "No foods matched your search.";
    pub const ANALYZING_IMAGE: &str = "Analyzing food image...";
}

/// Supported still image formats for the file camera source
pub mod file_formats {
    /// Supported image file extensions
    pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "bmp", "webp"];

    /// Check if a file extension is a supported image format
    pub fn is_image_extension(ext: &str) -> bool {
        IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str())
    }
}

/// Application metadata
pub mod app_info {
    /// Version string including the git revision
    pub fn version() -> &'static str {
        env!("GIT_VERSION")
    }

    /// User agent sent with every request
    pub fn user_agent() -> String {
        format!("nutricam/{}", version())
    }
}
