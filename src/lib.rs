//! Library root for the `sentiment_service` crate
//!
//! Serves a pre-fitted TF-IDF + logistic regression sentiment classifier over
//! HTTP. Artifacts are loaded once at startup into an immutable
//! [`app_state::ServiceContext`]; a failed load degrades the health report
//! instead of stopping the process.

// Core error handling
pub mod api_errors;
pub mod errors;

// Model artifacts and inference
pub mod artifact_loader;
pub mod inference;
pub mod linear_model;
pub mod vectorizer;

// Request validation and text cleaning
pub mod input_validator;

// Service state and HTTP interface
pub mod app_state;
pub mod web;

// Configuration, logging & CLI
pub mod cli;
pub mod config_loader;
pub mod logging;

#[cfg(test)]
mod tests {
    pub mod test_utils;
    pub mod artifact_loader_test;
    pub mod inference_test;
    pub mod input_validator_test;
    pub mod vectorizer_test;
}

pub use app_state::{HealthResponse, PredictResponse, ServiceContext};
pub use errors::{ServiceError, ServiceResult};
pub use inference::{InferenceEngine, Prediction};
pub use linear_model::Sentiment;
