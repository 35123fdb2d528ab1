//! Request validation and text cleaning.
//!
//! `clean_text` must stay identical to the cleaning applied when the
//! vectorizer vocabulary was fitted. Any drift silently lowers prediction
//! quality, so the known input/output pairs are pinned in tests.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::{ServiceError, ServiceResult};

/// JSON field carrying the review text
pub const REVIEW_FIELD: &str = "review";

lazy_static! {
    static ref HTML_TAG_PATTERN: Regex = Regex::new(r"<.*?>").unwrap();
    static ref DIGITS_PATTERN: Regex = Regex::new(r"\d+").unwrap();
}

/// Normalize raw review text the way the training corpus was normalized:
/// lowercase, drop HTML tags, drop digit runs, drop ASCII punctuation.
pub fn clean_text(text: &str) -> String {
    let lowered = text.to_lowercase();
    let without_tags = HTML_TAG_PATTERN.replace_all(&lowered, "");
    let without_digits = DIGITS_PATTERN.replace_all(&without_tags, "");
    without_digits
        .chars()
        .filter(|c| !c.is_ascii_punctuation())
        .collect()
}

/// A prediction request that passed validation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictRequest {
    pub review: String,
}

impl PredictRequest {
    /// Validate an arbitrary JSON payload into a request.
    ///
    /// The body must be an object with a string `review` that is non-empty
    /// after trimming whitespace. Text that only becomes empty after
    /// [`clean_text`] is accepted; it vectorizes to all zeros.
    pub fn from_json(payload: &Value) -> ServiceResult<Self> {
        let object = payload.as_object().ok_or_else(|| {
            ServiceError::invalid_input("body", "request body must be a JSON object")
        })?;

        let review = match object.get(REVIEW_FIELD) {
            None | Some(Value::Null) => {
                return Err(ServiceError::invalid_input(
                    REVIEW_FIELD,
                    "No review text provided",
                ))
            }
            Some(Value::String(s)) => s,
            Some(other) => {
                return Err(ServiceError::invalid_input(
                    REVIEW_FIELD,
                    format!("expected a string, got {}", json_type_name(other)),
                ))
            }
        };

        if review.trim().is_empty() {
            return Err(ServiceError::invalid_input(
                REVIEW_FIELD,
                "review text must not be empty",
            ));
        }

        Ok(Self {
            review: review.clone(),
        })
    }

    /// Text as the vectorizer expects it
    pub fn cleaned(&self) -> String {
        clean_text(&self.review)
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
