// SPDX-License-Identifier: GPL-3.0-only

//! Nutrition server client
//!
//! The workflows talk to the server through [`FoodApi`] so they can be
//! driven against an in-memory fake. [`HttpFoodApi`] is the real thing.

pub mod http;
pub mod types;

pub use http::HttpFoodApi;
pub use types::{FoodSearchHit, ProductMatch, RecognitionGuess};

use crate::errors::ServerError;
use async_trait::async_trait;

/// Submission endpoints of the nutrition server
///
/// Every method makes exactly one request. Errors carry the message to show
/// to the user; causes are logged by the implementation.
#[async_trait]
pub trait FoodApi: Send + Sync {
    /// `POST /scan-barcode`
    async fn lookup_barcode(&self, barcode: &str) -> Result<ProductMatch, ServerError>;

    /// `POST /recognize-food` with a JPEG image
    async fn recognize_food(&self, jpeg: Vec<u8>) -> Result<RecognitionGuess, ServerError>;

    /// `GET /search-food?q=`
    async fn search_food(&self, query: &str) -> Result<Vec<FoodSearchHit>, ServerError>;
}
