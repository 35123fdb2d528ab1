use std::sync::Arc;

use crate::errors::ServiceError;
use crate::inference::InferenceEngine;
use crate::linear_model::{logistic, LogisticModel, Sentiment, DECISION_THRESHOLD};
use crate::tests::test_utils::{assert_close, engine, model_artifact, vectorizer, INTERCEPT};
use crate::vectorizer::SparseVector;

const SAMPLES: &[&str] = &[
    "great movie",
    "terrible boring movie",
    "great great terrible",
    "movie",
    "",
    "nothing in the vocabulary here",
    "boring",
];

#[test]
fn positive_text_is_positive() {
    let p = engine().predict("great movie").unwrap();
    let norm = (1.5f64 * 1.5 + 1.0).sqrt();
    let decision = INTERCEPT + 2.0 * 1.5 / norm;

    assert_eq!(p.label, Sentiment::Positive);
    assert_close(p.decision, decision);
    assert_close(p.confidence, logistic(decision));
    assert_eq!(p.matched_terms, 2);
}

#[test]
fn negative_text_is_negative() {
    let p = engine().predict("terrible boring movie").unwrap();
    assert_eq!(p.label, Sentiment::Negative);
    assert!(p.decision < 0.0);
    assert_close(p.confidence, 1.0 - p.probability);
}

#[test]
fn zero_vector_falls_back_to_intercept() {
    let p = engine().predict("zzz qqq").unwrap();
    assert_eq!(p.matched_terms, 0);
    assert_close(p.decision, INTERCEPT);
    assert_eq!(p.label, Sentiment::Negative);
    assert_close(p.confidence, 1.0 - logistic(INTERCEPT));

    let empty = engine().predict("").unwrap();
    assert_eq!(empty, p);
}

#[test]
fn predictions_are_deterministic() {
    let engine = engine();
    for text in SAMPLES {
        let a = engine.predict(text).unwrap();
        let b = engine.predict(text).unwrap();
        assert_eq!(a.label, b.label);
        assert_eq!(a.confidence.to_bits(), b.confidence.to_bits());
    }
}

#[test]
fn confidence_is_bounded_and_matches_label() {
    let engine = engine();
    for text in SAMPLES {
        let p = engine.predict(text).unwrap();
        assert!((0.0..=1.0).contains(&p.confidence), "{text}: {}", p.confidence);
        assert!(p.confidence >= 0.5);

        // Second class iff its probability clears the threshold
        let positive = p.probability > DECISION_THRESHOLD;
        assert_eq!(p.label == Sentiment::Positive, positive, "{text}");
        if positive {
            assert_close(p.confidence, p.probability);
        } else {
            assert_close(p.confidence, 1.0 - p.probability);
        }
    }
}

#[test]
fn exact_tie_goes_to_first_class() {
    let mut artifact = model_artifact();
    artifact.intercept = 0.0;
    let model = LogisticModel::try_from(artifact).unwrap();

    let score = model.evaluate(&SparseVector::zeros(4)).unwrap();
    assert_eq!(score.probability, 0.5);
    assert_eq!(score.label, Sentiment::Negative);
    assert_eq!(score.confidence, 0.5);
}

#[test]
fn class_order_controls_the_label() {
    let mut artifact = model_artifact();
    artifact.classes = vec![Sentiment::Positive, Sentiment::Negative];
    let model = Arc::new(LogisticModel::try_from(artifact).unwrap());
    let flipped = InferenceEngine::new(vectorizer(), model).unwrap();

    assert_eq!(flipped.predict("great movie").unwrap().label, Sentiment::Negative);
}

#[test]
fn mismatched_dimensions_are_rejected() {
    let mut artifact = model_artifact();
    artifact.coef.push(1.0);
    let model = Arc::new(LogisticModel::try_from(artifact).unwrap());

    let err = InferenceEngine::new(vectorizer(), model.clone()).unwrap_err();
    assert!(matches!(err, ServiceError::ArtifactShape { .. }));

    // Scoring a vector of the wrong size directly is an internal error
    let err = model.evaluate(&SparseVector::zeros(4)).unwrap_err();
    assert!(matches!(err, ServiceError::Internal { .. }));
}

#[test]
fn model_artifact_validation() {
    let mut a = model_artifact();
    a.coef.clear();
    assert!(LogisticModel::try_from(a).is_err());

    let mut a = model_artifact();
    a.coef[1] = f64::INFINITY;
    assert!(LogisticModel::try_from(a).is_err());

    let mut a = model_artifact();
    a.intercept = f64::NAN;
    assert!(LogisticModel::try_from(a).is_err());

    let mut a = model_artifact();
    a.classes = vec![Sentiment::Positive];
    assert!(LogisticModel::try_from(a).is_err());

    let mut a = model_artifact();
    a.classes = vec![Sentiment::Positive, Sentiment::Positive];
    assert!(LogisticModel::try_from(a).is_err());
}

#[test]
fn logistic_is_stable_at_extremes() {
    assert_eq!(logistic(0.0), 0.5);
    assert!(logistic(800.0) <= 1.0);
    assert!(logistic(-800.0) >= 0.0);
    assert!(logistic(-800.0).is_finite());
    assert_close(logistic(2.0) + logistic(-2.0), 1.0);
}

#[test]
fn engine_is_shareable_across_threads() {
    let engine = Arc::new(engine());
    let expected = engine.predict("great movie").unwrap();

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let engine = Arc::clone(&engine);
            std::thread::spawn(move || engine.predict("great movie").unwrap())
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap(), expected);
    }
}
