// SPDX-License-Identifier: MPL-2.0

//! Processing pipelines
//!
//! - [`photo`]: snapshot capture and JPEG encoding for food recognition

pub mod photo;
