// SPDX-License-Identifier: MPL-2.0

//! nutricam - barcode scanning and food recognition for a nutrition tracker
//!
//! Acquires a camera, captures a sample (a barcode string or a JPEG frame),
//! submits it to the nutrition server, renders the outcome, and releases
//! every media resource on every exit path.
//!
//! # Architecture
//!
//! - [`backends`]: camera backend abstraction (V4L2, still image)
//! - [`decode`]: bundled barcode decoders and the continuous decode loop
//! - [`pipelines`]: snapshot capture and JPEG encoding
//! - [`client`]: nutrition server client
//! - [`capture`]: the barcode and food recognition workflows
//! - [`render`]: result fragments and the result panel
//! - [`config`]: user configuration handling

pub mod backends;
pub mod capture;
pub mod client;
pub mod config;
pub mod constants;
pub mod decode;
pub mod errors;
pub mod pipelines;
pub mod render;

// Re-export commonly used types
pub use capture::{BarcodeScanner, CaptureResult, FoodRecognizer, HandoffMode};
pub use client::{FoodApi, HttpFoodApi};
pub use config::Config;
pub use render::{ResultPanel, ResultView};
