use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::errors::{ArtifactKind, ServiceError, ServiceResult};
use crate::linear_model::{LogisticModel, Sentiment};
use crate::vectorizer::TfidfVectorizer;

/// Label and calibrated confidence for one piece of text
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub label: Sentiment,
    /// Probability of `label`, in `[0.5, 1]`
    pub confidence: f64,
    /// Probability the model assigns to its second class
    pub probability: f64,
    pub decision: f64,
    /// Number of vocabulary columns the text activated
    pub matched_terms: usize,
}

/// A vectorizer and classifier whose dimensions are known to agree.
///
/// Both halves are shared read-only handles, so cloning an engine is cheap and
/// every clone sees the same artifacts.
#[derive(Debug, Clone)]
pub struct InferenceEngine {
    vectorizer: Arc<TfidfVectorizer>,
    classifier: Arc<LogisticModel>,
}

impl InferenceEngine {
    pub fn new(
        vectorizer: Arc<TfidfVectorizer>,
        classifier: Arc<LogisticModel>,
    ) -> ServiceResult<Self> {
        if vectorizer.dimension() != classifier.dimension() {
            return Err(ServiceError::artifact_shape(
                ArtifactKind::Classifier,
                format!(
                    "classifier expects {} features but vectorizer produces {}",
                    classifier.dimension(),
                    vectorizer.dimension()
                ),
            ));
        }
        Ok(Self {
            vectorizer,
            classifier,
        })
    }

    /// Predict the sentiment of already-cleaned text. Text with no known
    /// terms is valid and falls back to the intercept.
    pub fn predict(&self, cleaned_text: &str) -> ServiceResult<Prediction> {
        let features = self.vectorizer.transform(cleaned_text);
        let score = self.classifier.evaluate(&features)?;

        Ok(Prediction {
            label: score.label,
            confidence: score.confidence,
            probability: score.probability,
            decision: score.decision,
            matched_terms: features.nnz(),
        })
    }
}
