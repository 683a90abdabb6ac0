//! Prediction output

use serde::{Deserialize, Serialize};

/// Profitability label decoded from the classifier output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InferenceResponse {
    /// Human-readable label from the label encoder vocabulary (e.g. "High")
    pub label: String,
    /// Raw class index emitted by the classifier
    pub class_index: i64,
}

impl InferenceResponse {
    pub fn new(label: impl Into<String>, class_index: i64) -> Self {
        Self {
            label: label.into(),
            class_index,
        }
    }
}
