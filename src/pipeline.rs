//! Request -> label inference over the shared artifacts

use crate::artifacts::Artifacts;
use crate::error::{PipelineError, Result};
use crate::types::{InferenceRequest, InferenceResponse};
use std::sync::Arc;
use tracing::debug;

/// Runs preprocess -> classify -> decode for batches of requests.
///
/// Stateless apart from the immutable artifacts, so identical requests
/// always yield identical responses.
#[derive(Clone)]
pub struct InferencePipeline {
    artifacts: Arc<Artifacts>,
}

impl InferencePipeline {
    pub fn new(artifacts: Arc<Artifacts>) -> Self {
        Self { artifacts }
    }

    pub fn artifacts(&self) -> &Artifacts {
        &self.artifacts
    }

    /// Predict a single request.
    pub fn predict(&self, request: &InferenceRequest) -> Result<InferenceResponse> {
        self.predict_batch(std::slice::from_ref(request))?
            .pop()
            .ok_or_else(|| PipelineError::schema("classifier returned no prediction"))
    }

    /// Predict a batch; response `i` corresponds to `requests[i]`.
    pub fn predict_batch(&self, requests: &[InferenceRequest]) -> Result<Vec<InferenceResponse>> {
        if requests.is_empty() {
            return Ok(Vec::new());
        }

        let features = self.artifacts.preprocessor().transform(requests)?;

        let classifier = self.artifacts.classifier();
        if let Some(expected) = classifier.n_features() {
            if expected != features.cols() {
                return Err(PipelineError::schema(format!(
                    "preprocessor produced {} features but model '{}' expects {}",
                    features.cols(),
                    classifier.name(),
                    expected
                )));
            }
        }

        let indices = classifier.predict(&features)?;
        if indices.len() != requests.len() {
            return Err(PipelineError::schema(format!(
                "model '{}' returned {} predictions for {} requests",
                classifier.name(),
                indices.len(),
                requests.len()
            )));
        }

        let labels = self.artifacts.label_encoder().inverse_transform(&indices)?;

        debug!(
            batch = requests.len(),
            model = %classifier.name(),
            labels = ?labels,
            "Batch inference complete"
        );

        Ok(labels
            .into_iter()
            .zip(indices)
            .map(|(label, index)| InferenceResponse::new(label, index))
            .collect())
    }
}
