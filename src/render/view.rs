// SPDX-License-Identifier: GPL-3.0-only

//! Result fragments
//!
//! Each variant is one fixed state of the result area. Builders map a
//! [`CaptureResult`] onto a view; nothing here has side effects.

use crate::capture::CaptureResult;
use crate::client::types::{FoodSearchHit, ProductMatch, RecognitionGuess};
use crate::constants::messages;
use std::fmt;

/// User action offered by a fragment
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Hand a matched product off to the food log
    AddToFoodLog { food_id: i64, food_name: String },
    /// Hand a food name off to the food log search
    SearchFor { query: String },
    /// Start the same capture again
    Retry,
    /// Start the recognition camera again
    TakeAnotherPhoto,
    /// Show manual barcode entry
    EnterManually,
    /// Show manual food search
    SearchManually,
}

impl Action {
    /// Button label
    pub fn label(&self) -> String {
        match self {
            Action::AddToFoodLog { .. } => "Add to Food Log".to_string(),
            Action::SearchFor { query } => format!("Search for \"{}\"", query),
            Action::Retry => "Try Again".to_string(),
            Action::TakeAnotherPhoto => "Take Another Photo".to_string(),
            Action::EnterManually => "Enter Barcode Manually".to_string(),
            Action::SearchManually => "Search Manually".to_string(),
        }
    }
}

/// One search result row
#[derive(Debug, Clone, PartialEq)]
pub struct SearchRow {
    pub name: String,
    pub brand: Option<String>,
    pub calories: String,
    pub action: Action,
}

/// Contents of the result area
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ResultView {
    #[default]
    Empty,
    Loading {
        message: String,
    },
    ProductFound {
        name: String,
        brand: Option<String>,
        calories: String,
        protein: String,
        action: Action,
    },
    FoodRecognized {
        recognized: String,
        suggestions: Vec<Action>,
        actions: Vec<Action>,
    },
    SearchResults {
        query: String,
        rows: Vec<SearchRow>,
    },
    NotFound {
        message: String,
        actions: Vec<Action>,
    },
    DeviceError {
        message: String,
        actions: Vec<Action>,
    },
    ServerError {
        message: String,
        actions: Vec<Action>,
    },
    ManualBarcodeEntry,
    ManualFoodSearch,
    Tips,
}

/// Tips shown before recognition
pub const RECOGNITION_TIPS: [&str; 5] = [
    "Ensure good lighting",
    "Keep the food clearly visible in the frame",
    "Avoid shadows and reflections",
    "Hold the camera steady",
    "Try to isolate the main food item",
];

/// Format a per-100g amount; missing values show as 0
pub fn format_amount(value: Option<f64>) -> String {
    format!("{}", value.unwrap_or(0.0))
}

impl ResultView {
    pub fn loading(message: impl Into<String>) -> Self {
        ResultView::Loading {
            message: message.into(),
        }
    }

    /// Loading fragment for a barcode lookup
    pub fn looking_up(barcode: &str) -> Self {
        Self::loading(format!("Looking up product: {}", barcode))
    }

    /// Barcode scanner fragment for a lookup result
    pub fn for_product(result: &CaptureResult<ProductMatch>) -> Self {
        match result {
            CaptureResult::Found(product) => ResultView::ProductFound {
                name: product.name.clone(),
                brand: product.brand.clone().filter(|b| !b.is_empty()),
                calories: format_amount(product.calories_per_100g),
                protein: format!("{}g", format_amount(product.protein_per_100g)),
                action: Action::AddToFoodLog {
                    food_id: product.id,
                    food_name: product.name.clone(),
                },
            },
            CaptureResult::NotFound => ResultView::NotFound {
                message: messages::PRODUCT_NOT_FOUND.to_string(),
                actions: vec![Action::Retry, Action::EnterManually],
            },
            CaptureResult::DeviceError(message) => Self::barcode_device_error(message),
            CaptureResult::ServerError(message) => Self::barcode_error(message),
        }
    }

    /// Food recognition fragment for a recognition result
    pub fn for_recognition(result: &CaptureResult<RecognitionGuess>) -> Self {
        match result {
            CaptureResult::Found(guess) => ResultView::FoodRecognized {
                recognized: guess.recognized.clone(),
                suggestions: guess
                    .suggestions
                    .iter()
                    .map(|s| Action::SearchFor { query: s.clone() })
                    .collect(),
                actions: vec![
                    Action::SearchFor {
                        query: guess.recognized.clone(),
                    },
                    Action::TakeAnotherPhoto,
                ],
            },
            CaptureResult::NotFound => ResultView::NotFound {
                message: messages::FOOD_NOT_RECOGNIZED.to_string(),
                actions: vec![Action::Retry, Action::SearchManually],
            },
            CaptureResult::DeviceError(message) => ResultView::DeviceError {
                message: message.clone(),
                actions: vec![Action::Retry, Action::SearchManually],
            },
            CaptureResult::ServerError(message) => Self::recognition_error(message),
        }
    }

    /// Food log search fragment
    pub fn for_search(query: &str, result: &CaptureResult<Vec<FoodSearchHit>>) -> Self {
        match result {
            CaptureResult::Found(hits) => ResultView::SearchResults {
                query: query.to_string(),
                rows: hits
                    .iter()
                    .map(|hit| SearchRow {
                        name: hit.name.clone(),
                        brand: hit.brand.clone().filter(|b| !b.is_empty()),
                        calories: format_amount(hit.calories_per_100g),
                        action: Action::AddToFoodLog {
                            food_id: hit.id,
                            food_name: hit.name.clone(),
                        },
                    })
                    .collect(),
            },
            CaptureResult::NotFound => ResultView::NotFound {
                message: messages::NO_SEARCH_RESULTS.to_string(),
                actions: vec![Action::SearchManually],
            },
            CaptureResult::DeviceError(message) | CaptureResult::ServerError(message) => {
                ResultView::ServerError {
                    message: message.clone(),
                    actions: vec![Action::SearchManually],
                }
            }
        }
    }

    /// Barcode error with a retry button
    pub fn barcode_error(message: &str) -> Self {
        ResultView::ServerError {
            message: message.to_string(),
            actions: vec![Action::Retry],
        }
    }

    /// Camera failure in the barcode scanner
    pub fn barcode_device_error(message: &str) -> Self {
        ResultView::DeviceError {
            message: message.to_string(),
            actions: vec![Action::Retry, Action::EnterManually],
        }
    }

    /// Recognition error with retry and manual search
    pub fn recognition_error(message: &str) -> Self {
        ResultView::ServerError {
            message: message.to_string(),
            actions: vec![Action::Retry, Action::SearchManually],
        }
    }

    /// Actions offered by this fragment
    pub fn actions(&self) -> Vec<&Action> {
        match self {
            ResultView::ProductFound { action, .. } => vec![action],
            ResultView::FoodRecognized {
                suggestions,
                actions,
                ..
            } => suggestions.iter().chain(actions.iter()).collect(),
            ResultView::SearchResults { rows, .. } => rows.iter().map(|r| &r.action).collect(),
            ResultView::NotFound { actions, .. }
            | ResultView::DeviceError { actions, .. }
            | ResultView::ServerError { actions, .. } => actions.iter().collect(),
            _ => Vec::new(),
        }
    }

    /// Check if this is a success fragment
    pub fn is_success(&self) -> bool {
        matches!(
            self,
            ResultView::ProductFound { .. }
                | ResultView::FoodRecognized { .. }
                | ResultView::SearchResults { .. }
        )
    }
}

fn write_actions(f: &mut fmt::Formatter<'_>, actions: &[Action]) -> fmt::Result {
    let labels: Vec<String> = actions.iter().map(|a| format!("[{}]", a.label())).collect();
    if !labels.is_empty() {
        write!(f, "\n{}", labels.join(" "))?;
    }
    Ok(())
}

impl fmt::Display for ResultView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResultView::Empty => Ok(()),
            ResultView::Loading { message } => write!(f, "{}", message),
            ResultView::ProductFound {
                name,
                brand,
                calories,
                protein,
                action,
            } => {
                writeln!(f, "Product Found!")?;
                writeln!(f, "{}", name)?;
                if let Some(brand) = brand {
                    writeln!(f, "{}", brand)?;
                }
                writeln!(f, "{} Calories/100g", calories)?;
                write!(f, "{} Protein/100g", protein)?;
                write_actions(f, std::slice::from_ref(action))
            }
            ResultView::FoodRecognized {
                recognized,
                suggestions,
                actions,
            } => {
                writeln!(f, "Food Recognized!")?;
                write!(f, "We think this might be: {}", recognized)?;
                if !suggestions.is_empty() {
                    write!(f, "\nSearch suggestions:")?;
                    for suggestion in suggestions {
                        if let Action::SearchFor { query } = suggestion {
                            write!(f, "\n  {}", query)?;
                        }
                    }
                }
                write_actions(f, actions)
            }
            ResultView::SearchResults { query, rows } => {
                write!(f, "Results for \"{}\":", query)?;
                for (index, row) in rows.iter().enumerate() {
                    write!(f, "\n  [{}] {}", index + 1, row.name)?;
                    if let Some(brand) = &row.brand {
                        write!(f, " ({})", brand)?;
                    }
                    write!(f, " - {} kcal/100g", row.calories)?;
                }
                Ok(())
            }
            ResultView::NotFound { message, actions }
            | ResultView::DeviceError { message, actions }
            | ResultView::ServerError { message, actions } => {
                write!(f, "{}", message)?;
                write_actions(f, actions)
            }
            ResultView::ManualBarcodeEntry => write!(f, "Enter Barcode Manually"),
            ResultView::ManualFoodSearch => write!(f, "Search for Food Manually"),
            ResultView::Tips => {
                write!(f, "Tips for better food recognition:")?;
                for tip in RECOGNITION_TIPS {
                    write!(f, "\n  - {}", tip)?;
                }
                write!(f, "\n[Got it, let's try!]")
            }
        }
    }
}
