// Shared fixtures: a four-term vocabulary with hand-picked weights.
//
//   column  term      idf  coef
//   0       great     1.5   2.0
//   1       terrible  1.5  -2.0
//   2       movie     1.0   0.0
//   3       boring    2.0  -1.5
//
// intercept -0.25, so text with no known terms is "negative".

use std::collections::HashMap;
use std::sync::Arc;

use crate::inference::InferenceEngine;
use crate::linear_model::{LinearModelArtifact, LogisticModel, Sentiment};
use crate::vectorizer::{
    Norm, TfidfVectorizer, VectorizerArtifact, DEFAULT_TOKEN_PATTERN, WORD_ANALYZER,
};

pub const INTERCEPT: f64 = -0.25;

pub fn vectorizer_artifact() -> VectorizerArtifact {
    let vocabulary: HashMap<String, usize> =
        [("great", 0), ("terrible", 1), ("movie", 2), ("boring", 3)]
            .into_iter()
            .map(|(t, c)| (t.to_string(), c))
            .collect();

    VectorizerArtifact {
        vocabulary,
        idf: vec![1.5, 1.5, 1.0, 2.0],
        lowercase: true,
        token_pattern: DEFAULT_TOKEN_PATTERN.to_string(),
        ngram_range: (1, 1),
        stop_words: Vec::new(),
        sublinear_tf: false,
        norm: Some(Norm::L2),
        binary: false,
        use_idf: true,
        strip_accents: None,
        analyzer: WORD_ANALYZER.to_string(),
    }
}

pub fn model_artifact() -> LinearModelArtifact {
    LinearModelArtifact {
        coef: vec![2.0, -2.0, 0.0, -1.5],
        intercept: INTERCEPT,
        classes: vec![Sentiment::Negative, Sentiment::Positive],
    }
}

pub fn vectorizer() -> Arc<TfidfVectorizer> {
    let vectorizer = TfidfVectorizer::try_from(vectorizer_artifact());
    Arc::new(vectorizer.expect("fixture vectorizer is valid"))
}

pub fn model() -> Arc<LogisticModel> {
    Arc::new(LogisticModel::try_from(model_artifact()).expect("fixture model is valid"))
}

pub fn engine() -> InferenceEngine {
    InferenceEngine::new(vectorizer(), model()).expect("fixture artifacts agree")
}

pub fn vectorizer_json() -> Vec<u8> {
    serde_json::to_vec(&vectorizer_artifact()).unwrap()
}

pub fn model_json() -> Vec<u8> {
    serde_json::to_vec(&model_artifact()).unwrap()
}

pub fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {expected}, got {actual}"
    );
}
