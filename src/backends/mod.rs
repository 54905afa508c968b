// SPDX-License-Identifier: GPL-3.0-only

//! Backend abstractions for media devices
//!
//! - [`camera`]: camera enumeration and live streams

pub mod camera;
