//! Classifier artifact loader

use crate::error::{PipelineError, Result};
use crate::models::classifier::{Classifier, LinearClassifier};
use crate::models::onnx::OnnxClassifier;
use ort::session::{builder::GraphOptimizationLevel, Session};
use std::path::Path;
use std::sync::Mutex;
use tracing::info;

/// Loader for classifier artifacts
pub struct ModelLoader {
    /// Number of threads for ONNX inference
    onnx_threads: usize,
}

impl ModelLoader {
    /// Create a new model loader with default settings (1 thread)
    pub fn new() -> Self {
        Self::with_threads(1)
    }

    /// Create a new model loader with specified number of threads
    pub fn with_threads(onnx_threads: usize) -> Self {
        Self {
            onnx_threads: onnx_threads.max(1),
        }
    }

    /// Load a classifier, choosing the backend from the file extension.
    ///
    /// `.onnx` files run through ONNX Runtime; anything else is read as a
    /// JSON linear model.
    pub fn load_classifier<P: AsRef<Path>>(&self, path: P) -> Result<Box<dyn Classifier>> {
        let path = path.as_ref();
        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("classifier")
            .to_string();

        let is_onnx = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("onnx"));

        if is_onnx {
            Ok(Box::new(self.load_onnx(path, &name)?))
        } else {
            Ok(Box::new(LinearClassifier::load(path, &name)?))
        }
    }

    /// Load a single ONNX model from file
    pub fn load_onnx<P: AsRef<Path>>(&self, path: P, name: &str) -> Result<OnnxClassifier> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(PipelineError::missing("classifier", path, "file not found"));
        }

        info!(
            model = %name,
            path = %path.display(),
            threads = self.onnx_threads,
            "Loading ONNX model"
        );

        let session = Session::builder()
            .map_err(unreadable(path))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(unreadable(path))?
            .with_intra_threads(self.onnx_threads)
            .map_err(unreadable(path))?
            .commit_from_file(path)
            .map_err(unreadable(path))?;

        let input_name = session
            .inputs
            .first()
            .map(|i| i.name.clone())
            .unwrap_or_else(|| "float_input".to_string());

        let label_output = session
            .outputs
            .iter()
            .find(|o| o.name.contains("label"))
            .map(|o| o.name.clone());

        info!(
            model = %name,
            input = %input_name,
            label_output = ?label_output,
            "Model loaded successfully"
        );

        Ok(OnnxClassifier {
            name: name.to_string(),
            session: Mutex::new(session),
            input_name,
            label_output,
        })
    }
}

fn unreadable<E: std::fmt::Display>(path: &Path) -> impl Fn(E) -> PipelineError + '_ {
    move |e| PipelineError::missing("classifier", path, e)
}

impl Default for ModelLoader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_missing_onnx_model() {
        let dir = tempfile::tempdir().unwrap();
        let err = ModelLoader::new()
            .load_classifier(dir.path().join("xgb_model.onnx"))
            .err()
            .unwrap();
        assert!(err.is_artifact_missing());
    }

    #[test]
    fn test_json_extension_loads_linear_model() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, r#"{{"coef": [[1.0], [-1.0]], "intercept": [0.0, 0.0]}}"#).unwrap();

        let model = ModelLoader::new().load_classifier(file.path()).unwrap();
        assert_eq!(model.n_features(), Some(1));
    }
}
