//! Error handling for the sentiment service
//!
//! Library code reports failures through [`ServiceError`]. The HTTP layer maps
//! these onto the three wire-level kinds in [`crate::api_errors::AppError`].

use thiserror::Error;

/// Which of the two artifacts an error refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    Vectorizer,
    Classifier,
}

impl std::fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ArtifactKind::Vectorizer => f.write_str("vectorizer"),
            ArtifactKind::Classifier => f.write_str("classifier"),
        }
    }
}

/// Main error type for the sentiment service
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Failed to read {artifact} artifact from {location}")]
    ArtifactIo {
        artifact: ArtifactKind,
        location: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to decode {artifact} artifact: {source}")]
    ArtifactDecode {
        artifact: ArtifactKind,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid {artifact} artifact: {message}")]
    ArtifactShape {
        artifact: ArtifactKind,
        message: String,
    },

    #[error("Checksum mismatch for {artifact} artifact: expected {expected}, got {actual}")]
    ChecksumMismatch {
        artifact: ArtifactKind,
        expected: String,
        actual: String,
    },

    #[error("Invalid input for {field}: {message}")]
    InvalidInput { field: String, message: String },

    #[error("Model unavailable: {message}")]
    ModelUnavailable { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

pub type ServiceResult<T> = Result<T, ServiceError>;

impl ServiceError {
    pub fn artifact_io(
        artifact: ArtifactKind,
        location: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        Self::ArtifactIo {
            artifact,
            location: location.into(),
            source,
        }
    }

    pub fn artifact_decode(artifact: ArtifactKind, source: serde_json::Error) -> Self {
        Self::ArtifactDecode { artifact, source }
    }

    pub fn artifact_shape(artifact: ArtifactKind, message: impl Into<String>) -> Self {
        Self::ArtifactShape {
            artifact,
            message: message.into(),
        }
    }

    pub fn invalid_input(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidInput {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn model_unavailable(message: impl Into<String>) -> Self {
        Self::ModelUnavailable {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}
