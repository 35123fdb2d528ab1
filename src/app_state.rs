use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error, warn};

use crate::api_errors::AppError;
use crate::artifact_loader::{ArtifactStatus, LoadedArtifacts};
use crate::errors::ServiceError;
use crate::inference::InferenceEngine;
use crate::input_validator::PredictRequest;
use crate::linear_model::LogisticModel;
use crate::vectorizer::TfidfVectorizer;

/// Load flags fixed when the context is built
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthState {
    pub model_loaded: bool,
    pub vectorizer_loaded: bool,
}

impl HealthState {
    pub fn is_healthy(&self) -> bool {
        self.model_loaded && self.vectorizer_loaded
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictResponse {
    pub prediction: String,
    pub confidence: f64,
    pub original_text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub model_loaded: bool,
    pub vectorizer_loaded: bool,
}

/// Artifact metadata reported by `/info`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactInfo {
    pub vectorizer: Option<ArtifactStatus>,
    pub classifier: Option<ArtifactStatus>,
    pub vocabulary_size: Option<usize>,
    pub dimension: Option<usize>,
    pub loaded_at: Option<DateTime<Utc>>,
}

/// Immutable state shared by every request handler.
///
/// Built once at startup and handed to handlers behind an `Arc`; nothing in
/// here changes after construction, so requests never need a lock.
#[derive(Debug)]
pub struct ServiceContext {
    engine: Option<InferenceEngine>,
    health: HealthState,
    info: ArtifactInfo,
}

impl ServiceContext {
    /// Build from whatever the loaders produced. A mismatched pair is
    /// rejected here as well, leaving the model marked unavailable.
    pub fn new(
        vectorizer: Option<Arc<TfidfVectorizer>>,
        classifier: Option<Arc<LogisticModel>>,
    ) -> Self {
        let vectorizer_loaded = vectorizer.is_some();
        let mut model_loaded = classifier.is_some();

        let info = ArtifactInfo {
            vectorizer: None,
            classifier: None,
            vocabulary_size: vectorizer.as_ref().map(|v| v.vocabulary_size()),
            dimension: vectorizer.as_ref().map(|v| v.dimension()),
            loaded_at: None,
        };

        let engine = match (vectorizer, classifier) {
            (Some(v), Some(c)) => match InferenceEngine::new(v, c) {
                Ok(engine) => Some(engine),
                Err(e) => {
                    error!(error = %e, "artifacts are incompatible");
                    model_loaded = false;
                    None
                }
            },
            _ => None,
        };

        Self {
            engine,
            health: HealthState {
                model_loaded,
                vectorizer_loaded,
            },
            info,
        }
    }

    pub fn from_artifacts(loaded: LoadedArtifacts) -> Self {
        let mut ctx = Self::new(loaded.vectorizer, loaded.classifier);
        ctx.info.vectorizer = Some(loaded.vectorizer_status);
        ctx.info.classifier = Some(loaded.classifier_status);
        ctx.info.loaded_at = Some(loaded.loaded_at);
        ctx
    }

    /// Context with nothing loaded
    pub fn unavailable() -> Self {
        Self::new(None, None)
    }

    pub fn health_state(&self) -> HealthState {
        self.health
    }

    pub fn engine(&self) -> Option<&InferenceEngine> {
        self.engine.as_ref()
    }

    /// Classify the `review` field of a JSON payload
    pub fn predict(&self, payload: &Value) -> Result<PredictResponse, AppError> {
        let engine = self.engine.as_ref().ok_or_else(|| {
            warn!(health = ?self.health, "prediction requested while model is unavailable");
            AppError::model_unavailable("Model not loaded properly")
        })?;

        let request = PredictRequest::from_json(payload).map_err(|e| {
            debug!(error = %e, "rejected prediction request");
            AppError::from(e)
        })?;

        let prediction = engine.predict(&request.cleaned()).map_err(|e: ServiceError| {
            error!(error = %e, "inference failed");
            AppError::from(e)
        })?;

        debug!(
            label = %prediction.label,
            confidence = prediction.confidence,
            matched_terms = prediction.matched_terms,
            "prediction served"
        );

        Ok(PredictResponse {
            prediction: prediction.label.to_string(),
            confidence: prediction.confidence,
            original_text: request.review,
        })
    }

    pub fn health(&self) -> HealthResponse {
        HealthResponse {
            status: if self.health.is_healthy() {
                "healthy".to_string()
            } else {
                "degraded".to_string()
            },
            model_loaded: self.health.model_loaded,
            vectorizer_loaded: self.health.vectorizer_loaded,
        }
    }

    pub fn info(&self) -> ArtifactInfo {
        self.info.clone()
    }
}
