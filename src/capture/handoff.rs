// SPDX-License-Identifier: GPL-3.0-only

//! Handoff of a capture result to the food log
//!
//! The mode is decided once from configuration. `InPage` fills in the host's
//! food log entry directly; `Navigate` sends the host to the food log page
//! with the result in the query string.

use crate::constants::endpoints;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::info;

/// How results reach the food log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandoffMode {
    /// Pre-populate the food log entry hosted alongside the capture
    InPage,
    /// Navigate to the food log page
    #[default]
    Navigate,
}

impl FromStr for HandoffMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "in_page" | "inpage" => Ok(HandoffMode::InPage),
            "navigate" => Ok(HandoffMode::Navigate),
            other => Err(format!(
                "unknown handoff mode '{}' (expected in-page or navigate)",
                other
            )),
        }
    }
}

impl std::fmt::Display for HandoffMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HandoffMode::InPage => write!(f, "in-page"),
            HandoffMode::Navigate => write!(f, "navigate"),
        }
    }
}

/// What the host is asked to do
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandoffAction {
    /// Select a food in the food log entry form
    PrefillFoodLog { food_id: i64, food_name: String },
    /// Put a query into the food log search and run it
    SearchFoodLog { query: String },
    /// Go to a food log URL (path and query)
    Navigate { url: String },
}

/// Host side of a handoff
#[async_trait]
pub trait HandoffTarget: Send + Sync {
    /// Hide the capture UI; the session is already released
    fn close_capture(&self) {}

    async fn prefill_food_log(&self, food_id: i64, food_name: &str);

    async fn search_food_log(&self, query: &str);

    async fn navigate(&self, url: &str);
}

/// Builds and performs handoffs for one mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Handoff {
    mode: HandoffMode,
}

impl Handoff {
    pub fn new(mode: HandoffMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> HandoffMode {
        self.mode
    }

    /// Handoff for a matched product
    pub fn add_food(&self, food_id: i64, food_name: &str) -> HandoffAction {
        match self.mode {
            HandoffMode::InPage => HandoffAction::PrefillFoodLog {
                food_id,
                food_name: food_name.to_string(),
            },
            HandoffMode::Navigate => HandoffAction::Navigate {
                url: scanned_food_url(food_id),
            },
        }
    }

    /// Handoff for a food name to search
    pub fn search(&self, query: &str) -> HandoffAction {
        match self.mode {
            HandoffMode::InPage => HandoffAction::SearchFoodLog {
                query: query.to_string(),
            },
            HandoffMode::Navigate => HandoffAction::Navigate {
                url: search_url(query),
            },
        }
    }

    /// Close the capture UI and carry out the action
    pub async fn perform(&self, action: &HandoffAction, target: &dyn HandoffTarget) {
        target.close_capture();
        info!(?action, "Handing off to food log");
        match action {
            HandoffAction::PrefillFoodLog { food_id, food_name } => {
                target.prefill_food_log(*food_id, food_name).await
            }
            HandoffAction::SearchFoodLog { query } => target.search_food_log(query).await,
            HandoffAction::Navigate { url } => target.navigate(url).await,
        }
    }
}

/// `/food-log?scanned_food=<id>`
pub fn scanned_food_url(food_id: i64) -> String {
    format!(
        "{}?{}={}",
        endpoints::FOOD_LOG,
        endpoints::SCANNED_FOOD_PARAM,
        food_id
    )
}

/// `/food-log?search=<query>` with the query percent-encoded
pub fn search_url(query: &str) -> String {
    format!(
        "{}?{}={}",
        endpoints::FOOD_LOG,
        endpoints::SEARCH_PARAM,
        encode_uri_component(query)
    )
}

/// Percent-encode everything except unreserved URI characters
pub fn encode_uri_component(s: &str) -> String {
    let mut result = String::with_capacity(s.len() * 3);
    for c in s.chars() {
        match c {
            'A'..='Z' | 'a'..='z' | '0'..='9' => result.push(c),
            '-' | '_' | '.' | '!' | '~' | '*' | '\'' | '(' | ')' => result.push(c),
            _ => {
                let mut buf = [0u8; 4];
                for byte in c.encode_utf8(&mut buf).as_bytes() {
                    result.push_str(&format!("%{:02X}", byte));
                }
            }
        }
    }
    result
}
