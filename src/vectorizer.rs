//! Fitted TF-IDF transform.
//!
//! The on-disk artifact is the JSON export of a fitted scikit-learn
//! `TfidfVectorizer`: vocabulary, IDF weights and the tokenization settings
//! that affect `transform`. It is validated once when it is built and is
//! immutable afterwards.

use std::collections::{BTreeMap, HashMap, HashSet};

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::errors::{ArtifactKind, ServiceError, ServiceResult};

/// scikit-learn's default `(?u)\b\w\w+\b`; Rust regexes are Unicode-aware by default
pub const DEFAULT_TOKEN_PATTERN: &str = r"\b\w\w+\b";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Norm {
    L1,
    L2,
}

/// Analyzer name for word n-grams, the only analyzer supported
pub const WORD_ANALYZER: &str = "word";

/// Serialized form of the vectorizer.
///
/// Unknown keys are rejected so an export carrying settings this transform
/// does not understand fails to load instead of vectorizing differently.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VectorizerArtifact {
    pub vocabulary: HashMap<String, usize>,
    pub idf: Vec<f64>,
    #[serde(default = "default_true")]
    pub lowercase: bool,
    #[serde(default = "default_token_pattern")]
    pub token_pattern: String,
    #[serde(default = "default_ngram_range")]
    pub ngram_range: (usize, usize),
    #[serde(default)]
    pub stop_words: Vec<String>,
    #[serde(default)]
    pub sublinear_tf: bool,
    #[serde(default = "default_norm")]
    pub norm: Option<Norm>,
    /// Clip term counts to 1
    #[serde(default)]
    pub binary: bool,
    #[serde(default = "default_true")]
    pub use_idf: bool,
    #[serde(default)]
    pub strip_accents: Option<String>,
    #[serde(default = "default_analyzer")]
    pub analyzer: String,
}

fn default_true() -> bool {
    true
}

fn default_token_pattern() -> String {
    DEFAULT_TOKEN_PATTERN.to_string()
}

fn default_ngram_range() -> (usize, usize) {
    (1, 1)
}

fn default_norm() -> Option<Norm> {
    Some(Norm::L2)
}

fn default_analyzer() -> String {
    WORD_ANALYZER.to_string()
}

/// Sparse feature vector: `(column, value)` pairs sorted by column
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SparseVector {
    pub dimension: usize,
    pub entries: Vec<(usize, f64)>,
}

impl SparseVector {
    pub fn zeros(dimension: usize) -> Self {
        Self {
            dimension,
            entries: Vec::new(),
        }
    }

    pub fn is_zero(&self) -> bool {
        self.entries.iter().all(|(_, v)| *v == 0.0)
    }

    pub fn nnz(&self) -> usize {
        self.entries.len()
    }

    /// Dot product with a dense vector of the same dimension
    pub fn dot(&self, dense: &[f64]) -> f64 {
        self.entries
            .iter()
            .map(|(col, value)| value * dense[*col])
            .sum()
    }
}

/// Validated, ready-to-use TF-IDF vectorizer
#[derive(Debug, Clone)]
pub struct TfidfVectorizer {
    vocabulary: HashMap<String, usize>,
    idf: Vec<f64>,
    lowercase: bool,
    token_pattern: Regex,
    ngram_range: (usize, usize),
    stop_words: HashSet<String>,
    sublinear_tf: bool,
    binary: bool,
    norm: Option<Norm>,
}

impl TryFrom<VectorizerArtifact> for TfidfVectorizer {
    type Error = ServiceError;

    fn try_from(artifact: VectorizerArtifact) -> ServiceResult<Self> {
        let shape = |msg: String| ServiceError::artifact_shape(ArtifactKind::Vectorizer, msg);
        let dimension = artifact.idf.len();

        if dimension == 0 {
            return Err(shape("idf vector is empty".into()));
        }
        if artifact.vocabulary.len() != dimension {
            return Err(shape(format!(
                "vocabulary has {} terms but idf has {} entries",
                artifact.vocabulary.len(),
                dimension
            )));
        }

        let mut seen = vec![false; dimension];
        for (term, &column) in &artifact.vocabulary {
            if column >= dimension {
                return Err(shape(format!(
                    "term '{term}' maps to column {column}, dimension is {dimension}"
                )));
            }
            if seen[column] {
                return Err(shape(format!(
                    "column {column} is assigned to more than one term"
                )));
            }
            seen[column] = true;
        }

        if let Some((column, value)) = artifact
            .idf
            .iter()
            .enumerate()
            .find(|(_, v)| !v.is_finite() || **v <= 0.0)
        {
            return Err(shape(format!(
                "idf[{column}] = {value} is not a positive finite weight"
            )));
        }

        if artifact.analyzer != WORD_ANALYZER {
            return Err(shape(format!(
                "unsupported analyzer '{}', only '{WORD_ANALYZER}' is implemented",
                artifact.analyzer
            )));
        }
        if let Some(mode) = &artifact.strip_accents {
            return Err(shape(format!("unsupported strip_accents '{mode}'")));
        }
        if !artifact.use_idf {
            return Err(shape("use_idf = false is not supported".into()));
        }

        let (min_n, max_n) = artifact.ngram_range;
        if min_n == 0 || min_n > max_n {
            return Err(shape(format!("invalid ngram_range ({min_n}, {max_n})")));
        }

        let token_pattern = Regex::new(&artifact.token_pattern)
            .map_err(|e| shape(format!("token_pattern does not compile: {e}")))?;
        // Group 0 is the whole match; at most one explicit group selects the token.
        if token_pattern.captures_len() > 2 {
            return Err(shape(format!(
                "token_pattern has {} capture groups, at most 1 is allowed",
                token_pattern.captures_len() - 1
            )));
        }

        Ok(Self {
            vocabulary: artifact.vocabulary,
            idf: artifact.idf,
            lowercase: artifact.lowercase,
            token_pattern,
            ngram_range: artifact.ngram_range,
            stop_words: artifact.stop_words.into_iter().collect(),
            sublinear_tf: artifact.sublinear_tf,
            binary: artifact.binary,
            norm: artifact.norm,
        })
    }
}

impl TfidfVectorizer {
    /// Output dimensionality `D`
    pub fn dimension(&self) -> usize {
        self.idf.len()
    }

    pub fn vocabulary_size(&self) -> usize {
        self.vocabulary.len()
    }

    /// Column for a term, if it is in the fitted vocabulary
    pub fn column(&self, term: &str) -> Option<usize> {
        self.vocabulary.get(term).copied()
    }

    /// Split a document into the terms the vocabulary is keyed by
    pub fn analyze(&self, document: &str) -> Vec<String> {
        let document = if self.lowercase {
            document.to_lowercase()
        } else {
            document.to_string()
        };

        let tokens: Vec<&str> = if self.token_pattern.captures_len() == 2 {
            // A single capture group selects the token inside the match
            self.token_pattern
                .captures_iter(&document)
                .filter_map(|c| c.get(1))
                .map(|m| m.as_str())
                .filter(|t| !self.stop_words.contains(*t))
                .collect()
        } else {
            self.token_pattern
                .find_iter(&document)
                .map(|m| m.as_str())
                .filter(|t| !self.stop_words.contains(*t))
                .collect()
        };

        let (min_n, max_n) = self.ngram_range;
        let mut terms = Vec::new();
        for n in min_n..=max_n {
            if n > tokens.len() {
                break;
            }
            terms.extend(tokens.windows(n).map(|window| window.join(" ")));
        }
        terms
    }

    /// Map a document to its TF-IDF vector. Out-of-vocabulary terms are dropped.
    pub fn transform(&self, document: &str) -> SparseVector {
        // BTreeMap keeps column order stable so repeated calls sum identically.
        let mut counts: BTreeMap<usize, f64> = BTreeMap::new();
        for term in self.analyze(document) {
            if let Some(&column) = self.vocabulary.get(&term) {
                *counts.entry(column).or_insert(0.0) += 1.0;
            }
        }

        let mut entries: Vec<(usize, f64)> = counts
            .into_iter()
            .map(|(column, tf)| {
                let tf = if self.binary {
                    1.0
                } else if self.sublinear_tf {
                    1.0 + tf.ln()
                } else {
                    tf
                };
                (column, tf * self.idf[column])
            })
            .collect();

        let norm = match self.norm {
            Some(Norm::L2) => entries.iter().map(|(_, v)| v * v).sum::<f64>().sqrt(),
            Some(Norm::L1) => entries.iter().map(|(_, v)| v.abs()).sum::<f64>(),
            None => 1.0,
        };
        if norm > 0.0 && norm != 1.0 {
            for (_, value) in &mut entries {
                *value /= norm;
            }
        }

        SparseVector {
            dimension: self.dimension(),
            entries,
        }
    }
}
