// SPDX-License-Identifier: MPL-2.0

//! Integration tests for constants module

use nutricam::constants::{endpoints, file_formats, limits, messages};

#[test]
fn test_endpoint_paths() {
    // All endpoints are absolute paths on the server
    for path in [
        endpoints::SCAN_BARCODE,
        endpoints::RECOGNIZE_FOOD,
        endpoints::SEARCH_FOOD,
        endpoints::FOOD_LOG,
    ] {
        assert!(path.starts_with('/'), "{} should be absolute", path);
    }
    assert_eq!(endpoints::IMAGE_FIELD, "image");
}

#[test]
fn test_input_limits() {
    assert_eq!(limits::MIN_BARCODE_LENGTH, 8);
    assert_eq!(limits::MIN_SEARCH_LENGTH, 2);
    assert!(limits::MAX_RECOGNITION_ATTEMPTS >= 1);
}

#[test]
fn test_user_facing_messages_not_empty() {
    for message in [
        messages::CAMERA_ACCESS_DENIED,
        messages::SCANNER_INIT_FAILED,
        messages::CAPTURE_FAILED,
        messages::ATTEMPTS_EXHAUSTED,
        messages::ANALYZING_IMAGE,
    ] {
        assert!(!message.is_empty());
    }
}

#[test]
fn test_image_extensions_case_insensitive() {
    assert!(file_formats::is_image_extension("JPG"));
    assert!(file_formats::is_image_extension("png"));
    assert!(!file_formats::is_image_extension("mp4"));
}
