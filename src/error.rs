//! Error types for artifact loading and inference

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the inference core.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A serialized artifact is absent, unreadable, or not a valid artifact.
    #[error("Artifact '{artifact}' missing or unreadable at {path}: {reason}")]
    ArtifactMissing {
        artifact: String,
        path: PathBuf,
        reason: String,
    },

    /// Input records (or intermediate results) do not fit the trained schema.
    #[error("Schema mismatch: {0}")]
    SchemaMismatch(String),
}

impl PipelineError {
    pub(crate) fn missing(
        artifact: &str,
        path: impl Into<PathBuf>,
        reason: impl ToString,
    ) -> Self {
        Self::ArtifactMissing {
            artifact: artifact.to_string(),
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn schema(message: impl Into<String>) -> Self {
        Self::SchemaMismatch(message.into())
    }

    /// True for load-time failures that should abort startup.
    pub fn is_artifact_missing(&self) -> bool {
        matches!(self, Self::ArtifactMissing { .. })
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;

/// Read and deserialize a JSON artifact, mapping every failure to `ArtifactMissing`.
pub(crate) fn read_json_artifact<T: serde::de::DeserializeOwned>(
    artifact: &str,
    path: &std::path::Path,
) -> Result<T> {
    let bytes = std::fs::read(path).map_err(|e| PipelineError::missing(artifact, path, e))?;
    serde_json::from_slice(&bytes).map_err(|e| PipelineError::missing(artifact, path, e))
}
