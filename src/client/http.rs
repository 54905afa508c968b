// SPDX-License-Identifier: GPL-3.0-only

//! HTTP implementation of [`FoodApi`]

use super::FoodApi;
use super::types::{BarcodeRequest, BodyError, FoodSearchHit, ProductMatch, RecognitionGuess, parse_body};
use crate::constants::{app_info, endpoints, messages};
use crate::errors::{InitError, ServerError};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, error, info};

/// Nutrition server reached over HTTP
#[derive(Debug, Clone)]
pub struct HttpFoodApi {
    client: reqwest::Client,
    base_url: String,
}

impl HttpFoodApi {
    /// Create a client for the server at `base_url`
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, InitError> {
        let base_url = base_url.trim().trim_end_matches('/');
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(InitError::InvalidServerUrl(base_url.to_string()));
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(app_info::user_agent())
            .build()
            .map_err(|e| InitError::HttpClient(e.to_string()))?;

        info!(base_url, ?timeout, "Nutrition server client created");

        Ok(Self {
            client,
            base_url: base_url.to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Send a request and interpret its JSON body
    ///
    /// The body is read whatever the status code. Any failure other than a
    /// server-reported error becomes `failure`; the cause is only logged.
    async fn submit<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
        endpoint: &'static str,
        failure: &'static str,
    ) -> Result<T, ServerError> {
        let response = request.send().await.map_err(|e| {
            error!(endpoint, error = %e, "Request failed");
            ServerError::Transport(failure.to_string())
        })?;

        let status = response.status();
        let body: serde_json::Value = response.json().await.map_err(|e| {
            error!(endpoint, %status, error = %e, "Response body is not JSON");
            ServerError::Transport(failure.to_string())
        })?;

        match parse_body(body) {
            Ok(payload) => {
                debug!(endpoint, %status, "Request succeeded");
                Ok(payload)
            }
            Err(BodyError::Server(err)) => {
                info!(endpoint, %status, error = %err, "Server reported an error");
                Err(err)
            }
            Err(BodyError::Malformed(e)) => {
                error!(endpoint, %status, error = %e, "Unexpected response shape");
                Err(ServerError::Transport(failure.to_string()))
            }
        }
    }
}

#[async_trait]
impl FoodApi for HttpFoodApi {
    async fn lookup_barcode(&self, barcode: &str) -> Result<ProductMatch, ServerError> {
        let request = self
            .client
            .post(self.url(endpoints::SCAN_BARCODE))
            .json(&BarcodeRequest { barcode });
        self.submit(request, endpoints::SCAN_BARCODE, messages::LOOKUP_FAILED)
            .await
    }

    async fn recognize_food(&self, jpeg: Vec<u8>) -> Result<RecognitionGuess, ServerError> {
        let size = jpeg.len();
        let part = Part::bytes(jpeg)
            .file_name(endpoints::IMAGE_FILE_NAME)
            .mime_str("image/jpeg")
            .map_err(|e| {
                error!(error = %e, "Failed to build image part");
                ServerError::Transport(messages::ANALYZE_FAILED.to_string())
            })?;
        let form = Form::new().part(endpoints::IMAGE_FIELD, part);

        debug!(size, "Uploading food image");
        let request = self
            .client
            .post(self.url(endpoints::RECOGNIZE_FOOD))
            .multipart(form);
        self.submit(request, endpoints::RECOGNIZE_FOOD, messages::ANALYZE_FAILED)
            .await
    }

    async fn search_food(&self, query: &str) -> Result<Vec<FoodSearchHit>, ServerError> {
        let request = self
            .client
            .get(self.url(endpoints::SEARCH_FOOD))
            .query(&[("q", query)]);
        self.submit(request, endpoints::SEARCH_FOOD, messages::SEARCH_FAILED)
            .await
    }
}
