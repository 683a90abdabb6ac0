//! ONNX Runtime classifier backend

use crate::error::{PipelineError, Result};
use crate::models::classifier::{argmax, Classifier};
use crate::preprocess::FeatureMatrix;
use ort::session::Session;
use ort::value::Tensor;
use std::sync::Mutex;
use tracing::debug;

/// Classifier exported to ONNX (e.g. XGBoost via onnxmltools).
pub struct OnnxClassifier {
    /// Model name
    pub(crate) name: String,
    /// ONNX Runtime session (`run` needs exclusive access)
    pub(crate) session: Mutex<Session>,
    /// Input name for the feature tensor
    pub(crate) input_name: String,
    /// Output carrying int64 class labels, if the export has one
    pub(crate) label_output: Option<String>,
}

impl OnnxClassifier {
    /// Class indices from the model outputs.
    ///
    /// Prefers the int64 label tensor; otherwise takes the row-wise argmax
    /// of the first float tensor (class probabilities).
    fn extract_labels(
        &self,
        outputs: &ort::session::SessionOutputs,
        rows: usize,
    ) -> Result<Vec<i64>> {
        if let Some(label_output) = &self.label_output {
            if let Some(output) = outputs.get(label_output.as_str()) {
                if let Ok((_, data)) = output.try_extract_tensor::<i64>() {
                    debug!(model = %self.name, output = %label_output, "Extracted labels");
                    return Ok(data.to_vec());
                }
            }
        }

        for (name, output) in outputs.iter() {
            if name.contains("label") {
                continue;
            }

            if let Ok((_, data)) = output.try_extract_tensor::<f32>() {
                debug!(model = %self.name, output = %name, "Extracted probabilities");
                return labels_from_probabilities(data, rows).map_err(|e| {
                    PipelineError::schema(format!(
                        "model '{}' output '{}': {}",
                        self.name, name, e
                    ))
                });
            }
        }

        Err(PipelineError::schema(format!(
            "model '{}' produced neither a label nor a probability tensor",
            self.name
        )))
    }
}

/// Row-wise argmax over a flattened `[rows, n_classes]` probability tensor.
pub(crate) fn labels_from_probabilities(data: &[f32], rows: usize) -> Result<Vec<i64>> {
    if rows == 0 || data.is_empty() || data.len() % rows != 0 {
        return Err(PipelineError::schema(format!(
            "{} probabilities cannot be split into {} rows",
            data.len(),
            rows
        )));
    }

    let n_classes = data.len() / rows;
    Ok(data
        .chunks(n_classes)
        .map(|probs| argmax(probs) as i64)
        .collect())
}

impl Classifier for OnnxClassifier {
    fn name(&self) -> &str {
        &self.name
    }

    fn n_features(&self) -> Option<usize> {
        None
    }

    fn predict(&self, features: &FeatureMatrix) -> Result<Vec<i64>> {
        if features.is_empty() {
            return Ok(Vec::new());
        }

        // Input tensor shape [rows, num_features]
        let shape = vec![features.rows() as i64, features.cols() as i64];
        let input_tensor = Tensor::from_array((shape, features.as_slice().to_vec()))
            .map_err(|e| PipelineError::schema(format!("failed to create input tensor: {}", e)))?;

        let mut session = self
            .session
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let outputs = session
            .run(ort::inputs![&self.input_name => input_tensor])
            .map_err(|e| {
                PipelineError::schema(format!("model '{}' rejected input: {}", self.name, e))
            })?;

        self.extract_labels(&outputs, features.rows())
    }
}
