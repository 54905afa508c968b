// SPDX-License-Identifier: GPL-3.0-only

//! Server response payloads

use crate::errors::ServerError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Product returned by a barcode lookup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductMatch {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub calories_per_100g: Option<f64>,
    #[serde(default)]
    pub protein_per_100g: Option<f64>,
    #[serde(default)]
    pub carbs_per_100g: Option<f64>,
    #[serde(default)]
    pub fat_per_100g: Option<f64>,
}

/// Result of food image recognition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecognitionGuess {
    pub recognized: String,
    #[serde(default)]
    pub suggestions: Vec<String>,
}

/// One row of a food name search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoodSearchHit {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub calories_per_100g: Option<f64>,
    #[serde(default)]
    pub source: Option<String>,
}

/// Request body of a barcode lookup
#[derive(Debug, Clone, Serialize)]
pub struct BarcodeRequest<'a> {
    pub barcode: &'a str,
}

/// Why a body could not be turned into a payload
#[derive(Debug)]
pub enum BodyError {
    /// The server reported an error; shown to the user as is
    Server(ServerError),
    /// The body did not have the expected shape
    Malformed(serde_json::Error),
}

/// Interpret a JSON body regardless of HTTP status
///
/// An object carrying a non-empty `error` string wins over everything else.
pub fn parse_body<T: DeserializeOwned>(body: serde_json::Value) -> Result<T, BodyError> {
    if let Some(message) = body.get("error").and_then(|e| e.as_str()) {
        if !message.is_empty() {
            return Err(BodyError::Server(ServerError::Application(
                message.to_string(),
            )));
        }
    }
    serde_json::from_value(body).map_err(BodyError::Malformed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_error_field_wins() {
        let body = json!({"error": "Product not found", "id": 1, "name": "x"});
        match parse_body::<ProductMatch>(body) {
            Err(BodyError::Server(ServerError::Application(msg))) => {
                assert_eq!(msg, "Product not found")
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_product_with_missing_macros() {
        let body = json!({"id": 7, "name": "Oat Milk", "calories_per_100g": 45});
        let product: ProductMatch = parse_body(body).unwrap();
        assert_eq!(product.id, 7);
        assert_eq!(product.calories_per_100g, Some(45.0));
        assert_eq!(product.protein_per_100g, None);
        assert_eq!(product.brand, None);
    }

    #[test]
    fn test_suggestions_default_to_empty() {
        let guess: RecognitionGuess = parse_body(json!({"recognized": "apple"})).unwrap();
        assert!(guess.suggestions.is_empty());
    }

    #[test]
    fn test_wrong_shape_is_malformed() {
        assert!(matches!(
            parse_body::<RecognitionGuess>(json!({"name": "apple"})),
            Err(BodyError::Malformed(_))
        ));
    }

    #[test]
    fn test_search_list() {
        let hits: Vec<FoodSearchHit> = parse_body(json!([
            {"id": 1, "name": "Banana", "brand": null, "calories_per_100g": 89, "source": "local"}
        ]))
        .unwrap();
        assert_eq!(hits[0].source.as_deref(), Some("local"));
    }
}
