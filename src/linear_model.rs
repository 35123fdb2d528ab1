use serde::{Deserialize, Serialize};

use crate::errors::{ArtifactKind, ServiceError, ServiceResult};
use crate::vectorizer::SparseVector;

/// Probability above which `classes[1]` is predicted
pub const DECISION_THRESHOLD: f64 = 0.5;

/// Sentiment labels the classifier can emit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Negative,
    Positive,
}

impl Sentiment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sentiment::Negative => "negative",
            Sentiment::Positive => "positive",
        }
    }
}

impl std::fmt::Display for Sentiment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Serialized form of a fitted binary logistic regression
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearModelArtifact {
    pub coef: Vec<f64>,
    pub intercept: f64,
    /// `classes[1]` is the class selected by a positive decision score
    pub classes: Vec<Sentiment>,
}

/// Outcome of scoring a single feature vector
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearScore {
    /// Raw decision function: `intercept + coef · x`
    pub decision: f64,
    /// Logistic probability of `classes[1]`
    pub probability: f64,
    pub label: Sentiment,
    /// Probability of `label`
    pub confidence: f64,
}

/// Binary logistic regression with logistic scoring
#[derive(Debug, Clone)]
pub struct LogisticModel {
    coef: Vec<f64>,
    intercept: f64,
    classes: [Sentiment; 2],
}

impl TryFrom<LinearModelArtifact> for LogisticModel {
    type Error = ServiceError;

    fn try_from(artifact: LinearModelArtifact) -> ServiceResult<Self> {
        let shape = |msg: String| ServiceError::artifact_shape(ArtifactKind::Classifier, msg);

        if artifact.coef.is_empty() {
            return Err(shape("coef vector is empty".into()));
        }
        if let Some(index) = artifact.coef.iter().position(|w| !w.is_finite()) {
            return Err(shape(format!("coef[{index}] is not finite")));
        }
        if !artifact.intercept.is_finite() {
            return Err(shape("intercept is not finite".into()));
        }

        let classes: [Sentiment; 2] = artifact.classes.as_slice().try_into().map_err(|_| {
            shape(format!(
                "expected exactly 2 classes, found {}",
                artifact.classes.len()
            ))
        })?;
        if classes[0] == classes[1] {
            return Err(shape(format!("classes must be distinct, got {classes:?}")));
        }

        Ok(Self {
            coef: artifact.coef,
            intercept: artifact.intercept,
            classes,
        })
    }
}

impl LogisticModel {
    /// Number of input features the weights expect
    pub fn dimension(&self) -> usize {
        self.coef.len()
    }

    pub fn decision_function(&self, features: &SparseVector) -> ServiceResult<f64> {
        if features.dimension != self.coef.len() {
            return Err(ServiceError::internal(format!(
                "feature dimension {} does not match model dimension {}",
                features.dimension,
                self.coef.len()
            )));
        }
        Ok(self.intercept + features.dot(&self.coef))
    }

    /// Score a vector: decision function, logistic probability, then the
    /// label. `classes[1]` is chosen only when its probability is strictly
    /// above 0.5; an exact tie falls to `classes[0]`.
    pub fn evaluate(&self, features: &SparseVector) -> ServiceResult<LinearScore> {
        let decision = self.decision_function(features)?;
        if decision.is_nan() {
            return Err(ServiceError::internal("decision score is NaN"));
        }

        let probability = logistic(decision);
        let (label, confidence) = if probability > DECISION_THRESHOLD {
            (self.classes[1], probability)
        } else {
            (self.classes[0], 1.0 - probability)
        };

        Ok(LinearScore {
            decision,
            probability,
            label,
            confidence,
        })
    }
}

/// `1 / (1 + e^-x)`, evaluated without overflow for large |x|
pub fn logistic(x: f64) -> f64 {
    if x >= 0.0 {
        1.0 / (1.0 + (-x).exp())
    } else {
        let e = x.exp();
        e / (1.0 + e)
    }
}
