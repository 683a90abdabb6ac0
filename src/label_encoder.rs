//! Class label <-> index mapping learned at training time

use crate::error::{read_json_artifact, PipelineError, Result};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;
use tracing::info;

#[derive(Debug, Deserialize)]
struct LabelEncoderArtifact {
    classes: Vec<String>,
}

/// Maps classifier output indices back to profitability labels.
///
/// `classes[i]` is the label for class index `i`, in the order the
/// encoder was fitted (sorted, for a scikit-learn `LabelEncoder`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelEncoder {
    classes: Vec<String>,
}

impl LabelEncoder {
    pub fn new(classes: Vec<String>) -> std::result::Result<Self, String> {
        if classes.is_empty() {
            return Err("label encoder has no classes".to_string());
        }
        let unique: HashSet<&String> = classes.iter().collect();
        if unique.len() != classes.len() {
            return Err("label encoder classes are not unique".to_string());
        }
        Ok(Self { classes })
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let artifact: LabelEncoderArtifact = read_json_artifact("label encoder", path)?;
        let encoder = Self::new(artifact.classes)
            .map_err(|e| PipelineError::missing("label encoder", path, e))?;

        info!(
            path = %path.display(),
            classes = ?encoder.classes,
            "Label encoder loaded"
        );

        Ok(encoder)
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Index of `label`, if it is part of the trained vocabulary.
    pub fn transform(&self, label: &str) -> Option<i64> {
        self.classes
            .iter()
            .position(|c| c == label)
            .map(|i| i as i64)
    }

    /// Decode a single class index.
    pub fn decode(&self, index: i64) -> Result<&str> {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.classes.get(i))
            .map(String::as_str)
            .ok_or_else(|| {
                PipelineError::schema(format!(
                    "class index {} outside label vocabulary of {} classes",
                    index,
                    self.classes.len()
                ))
            })
    }

    /// Decode class indices to labels, preserving order.
    pub fn inverse_transform(&self, indices: &[i64]) -> Result<Vec<String>> {
        indices
            .iter()
            .map(|&i| self.decode(i).map(str::to_string))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn encoder() -> LabelEncoder {
        LabelEncoder::new(vec![
            "High".to_string(),
            "Low".to_string(),
            "Medium".to_string(),
        ])
        .unwrap()
    }

    #[test]
    fn test_inverse_transform() {
        let labels = encoder().inverse_transform(&[2, 0, 1, 0]).unwrap();
        assert_eq!(labels, vec!["Medium", "High", "Low", "High"]);
    }

    #[test]
    fn test_transform_roundtrip() {
        let encoder = encoder();
        assert_eq!(encoder.transform("Low"), Some(1));
        assert_eq!(encoder.transform("low"), None);
    }

    #[test]
    fn test_out_of_range_index_is_schema_mismatch() {
        let encoder = encoder();
        assert!(matches!(
            encoder.inverse_transform(&[0, 3]),
            Err(PipelineError::SchemaMismatch(_))
        ));
        assert!(encoder.decode(-1).is_err());
    }

    #[test]
    fn test_rejects_empty_and_duplicate_classes() {
        assert!(LabelEncoder::new(vec![]).is_err());
        assert!(LabelEncoder::new(vec!["High".to_string(), "High".to_string()]).is_err());
    }

    #[test]
    fn test_load() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"classes": ["High", "Low", "Medium"]}}"#).unwrap();

        let encoder = LabelEncoder::load(file.path()).unwrap();
        assert_eq!(encoder.len(), 3);
        assert_eq!(encoder.decode(0).unwrap(), "High");
    }
}
