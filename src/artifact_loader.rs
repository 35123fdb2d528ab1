//! Startup loading of the vectorizer and classifier artifacts.
//!
//! Loading never aborts the process. Each artifact either becomes an
//! immutable shared handle or is recorded as failed, and the service reports
//! the failure through its health endpoint.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, error, info};

use crate::errors::{ArtifactKind, ServiceError, ServiceResult};
use crate::linear_model::{LinearModelArtifact, LogisticModel};
use crate::vectorizer::{TfidfVectorizer, VectorizerArtifact};

/// Byte-level read access to serialized artifacts
pub trait ArtifactStore: Send + Sync {
    fn fetch(&self, artifact: ArtifactKind, location: &str) -> ServiceResult<Vec<u8>>;
}

/// Reads artifacts from the local filesystem, optionally below a base directory
#[derive(Debug, Clone, Default)]
pub struct FsArtifactStore {
    root: Option<PathBuf>,
}

impl FsArtifactStore {
    pub fn new() -> Self {
        Self { root: None }
    }

    pub fn rooted_at(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
        }
    }

    fn resolve(&self, location: &str) -> PathBuf {
        match &self.root {
            Some(root) => root.join(location),
            None => PathBuf::from(location),
        }
    }
}

impl ArtifactStore for FsArtifactStore {
    fn fetch(&self, artifact: ArtifactKind, location: &str) -> ServiceResult<Vec<u8>> {
        let path = self.resolve(location);
        fs::read(&path)
            .map_err(|e| ServiceError::artifact_io(artifact, path.display().to_string(), e))
    }
}

/// In-memory artifact store keyed by location
#[derive(Debug, Clone, Default)]
pub struct MemoryArtifactStore {
    blobs: HashMap<String, Vec<u8>>,
}

impl MemoryArtifactStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, location: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        self.insert(location, bytes);
        self
    }

    pub fn insert(&mut self, location: impl Into<String>, bytes: impl Into<Vec<u8>>) {
        self.blobs.insert(location.into(), bytes.into());
    }
}

impl ArtifactStore for MemoryArtifactStore {
    fn fetch(&self, artifact: ArtifactKind, location: &str) -> ServiceResult<Vec<u8>> {
        self.blobs.get(location).cloned().ok_or_else(|| {
            ServiceError::artifact_io(
                artifact,
                location,
                std::io::Error::new(std::io::ErrorKind::NotFound, "no such artifact"),
            )
        })
    }
}

/// Where to find the artifacts and, optionally, what their digests must be
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub vectorizer: String,
    pub classifier: String,
    pub vectorizer_sha256: Option<String>,
    pub classifier_sha256: Option<String>,
}

impl ArtifactPaths {
    pub fn new(vectorizer: impl Into<String>, classifier: impl Into<String>) -> Self {
        Self {
            vectorizer: vectorizer.into(),
            classifier: classifier.into(),
            vectorizer_sha256: None,
            classifier_sha256: None,
        }
    }
}

/// Outcome of loading a single artifact
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactStatus {
    pub location: String,
    pub loaded: bool,
    pub sha256: Option<String>,
    pub error: Option<String>,
}

impl ArtifactStatus {
    fn pending(location: &str) -> Self {
        Self {
            location: location.to_string(),
            loaded: false,
            sha256: None,
            error: None,
        }
    }

    fn fail(&mut self, err: &ServiceError) {
        self.loaded = false;
        self.error = Some(err.to_string());
    }
}

/// Everything startup produced: the usable handles plus a per-artifact report
#[derive(Debug, Clone)]
pub struct LoadedArtifacts {
    pub vectorizer: Option<Arc<TfidfVectorizer>>,
    pub classifier: Option<Arc<LogisticModel>>,
    pub vectorizer_status: ArtifactStatus,
    pub classifier_status: ArtifactStatus,
    pub loaded_at: DateTime<Utc>,
}

impl LoadedArtifacts {
    pub fn is_complete(&self) -> bool {
        self.vectorizer.is_some() && self.classifier.is_some()
    }
}

/// SHA-256 of `bytes` as lowercase hex
pub fn sha256_hex(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

/// Load both artifacts. Never fails; inspect the returned report instead.
pub fn load_artifacts(store: &dyn ArtifactStore, paths: &ArtifactPaths) -> LoadedArtifacts {
    let mut vectorizer_status = ArtifactStatus::pending(&paths.vectorizer);
    let mut classifier_status = ArtifactStatus::pending(&paths.classifier);

    let vectorizer = load_one::<VectorizerArtifact, TfidfVectorizer>(
        store,
        ArtifactKind::Vectorizer,
        &paths.vectorizer,
        paths.vectorizer_sha256.as_deref(),
        &mut vectorizer_status,
    );

    let mut classifier = load_one::<LinearModelArtifact, LogisticModel>(
        store,
        ArtifactKind::Classifier,
        &paths.classifier,
        paths.classifier_sha256.as_deref(),
        &mut classifier_status,
    );

    // A classifier fitted against a different vocabulary is unusable.
    if let (Some(v), Some(c)) = (&vectorizer, &classifier) {
        if v.dimension() != c.dimension() {
            let err = ServiceError::artifact_shape(
                ArtifactKind::Classifier,
                format!(
                    "classifier expects {} features but vectorizer produces {}",
                    c.dimension(),
                    v.dimension()
                ),
            );
            error!(error = %err, "rejecting classifier");
            classifier_status.fail(&err);
            classifier = None;
        }
    }

    let loaded = LoadedArtifacts {
        vectorizer,
        classifier,
        vectorizer_status,
        classifier_status,
        loaded_at: Utc::now(),
    };

    if loaded.is_complete() {
        info!("Model and vectorizer loaded successfully");
    } else {
        error!(
            vectorizer_loaded = loaded.vectorizer.is_some(),
            model_loaded = loaded.classifier.is_some(),
            "starting in degraded mode"
        );
    }

    loaded
}

fn load_one<A, T>(
    store: &dyn ArtifactStore,
    kind: ArtifactKind,
    location: &str,
    expected_sha256: Option<&str>,
    status: &mut ArtifactStatus,
) -> Option<Arc<T>>
where
    A: DeserializeOwned,
    T: TryFrom<A, Error = ServiceError>,
{
    match decode_artifact::<A, T>(store, kind, location, expected_sha256, status) {
        Ok(value) => {
            status.loaded = true;
            info!(
                artifact = %kind,
                location,
                sha256 = status.sha256.as_deref().unwrap_or_default(),
                "artifact loaded"
            );
            Some(Arc::new(value))
        }
        Err(err) => {
            error!(artifact = %kind, location, error = %err, "failed to load artifact");
            status.fail(&err);
            None
        }
    }
}

fn decode_artifact<A, T>(
    store: &dyn ArtifactStore,
    kind: ArtifactKind,
    location: &str,
    expected_sha256: Option<&str>,
    status: &mut ArtifactStatus,
) -> ServiceResult<T>
where
    A: DeserializeOwned,
    T: TryFrom<A, Error = ServiceError>,
{
    let bytes = store.fetch(kind, location)?;
    let digest = sha256_hex(&bytes);
    debug!(artifact = %kind, bytes = bytes.len(), sha256 = %digest, "artifact read");
    status.sha256 = Some(digest.clone());

    if let Some(expected) = expected_sha256 {
        if !expected.trim().eq_ignore_ascii_case(&digest) {
            return Err(ServiceError::ChecksumMismatch {
                artifact: kind,
                expected: expected.trim().to_lowercase(),
                actual: digest,
            });
        }
    }

    let raw: A =
        serde_json::from_slice(&bytes).map_err(|e| ServiceError::artifact_decode(kind, e))?;
    T::try_from(raw)
}
