//! Classifier abstraction and the JSON linear model backend

use crate::error::{read_json_artifact, PipelineError, Result};
use crate::preprocess::FeatureMatrix;
use serde::Deserialize;
use std::path::Path;
use tracing::info;

/// A trained classifier emitting one class index per feature row.
pub trait Classifier: Send + Sync {
    /// Model name for logging.
    fn name(&self) -> &str;

    /// Expected feature width, when the model format exposes it.
    fn n_features(&self) -> Option<usize>;

    /// Predict class indices; result `i` belongs to row `i`.
    fn predict(&self, features: &FeatureMatrix) -> Result<Vec<i64>>;
}

/// Index of the largest value; ties resolve to the lowest index.
pub(crate) fn argmax(values: &[f32]) -> usize {
    let mut best = 0;
    for (i, &v) in values.iter().enumerate().skip(1) {
        if v > values[best] {
            best = i;
        }
    }
    best
}

#[derive(Debug, Deserialize)]
struct LinearArtifact {
    coef: Vec<Vec<f64>>,
    intercept: Vec<f64>,
}

/// Multiclass linear model: `argmax(coef · x + intercept)`.
#[derive(Debug, Clone)]
pub struct LinearClassifier {
    name: String,
    coef: Vec<Vec<f64>>,
    intercept: Vec<f64>,
}

impl LinearClassifier {
    pub fn new(
        name: impl Into<String>,
        coef: Vec<Vec<f64>>,
        intercept: Vec<f64>,
    ) -> std::result::Result<Self, String> {
        if coef.is_empty() {
            return Err("linear model has no classes".to_string());
        }
        if coef.len() != intercept.len() {
            return Err(format!(
                "{} coefficient rows but {} intercepts",
                coef.len(),
                intercept.len()
            ));
        }
        let width = coef[0].len();
        if coef.iter().any(|row| row.len() != width) {
            return Err("coefficient rows have different widths".to_string());
        }

        Ok(Self {
            name: name.into(),
            coef,
            intercept,
        })
    }

    pub fn load<P: AsRef<Path>>(path: P, name: &str) -> Result<Self> {
        let path = path.as_ref();
        let artifact: LinearArtifact = read_json_artifact("classifier", path)?;
        let model = Self::new(name, artifact.coef, artifact.intercept)
            .map_err(|e| PipelineError::missing("classifier", path, e))?;

        info!(
            model = %name,
            path = %path.display(),
            classes = model.n_classes(),
            n_features = model.width(),
            "Linear model loaded"
        );

        Ok(model)
    }

    pub fn n_classes(&self) -> usize {
        self.coef.len()
    }

    fn width(&self) -> usize {
        self.coef[0].len()
    }

    /// Raw class scores for one feature row.
    pub fn decision_function(&self, row: &[f32]) -> Vec<f32> {
        self.coef
            .iter()
            .zip(&self.intercept)
            .map(|(weights, bias)| {
                let dot: f64 = weights
                    .iter()
                    .zip(row)
                    .map(|(w, &x)| w * x as f64)
                    .sum();
                (dot + bias) as f32
            })
            .collect()
    }
}

impl Classifier for LinearClassifier {
    fn name(&self) -> &str {
        &self.name
    }

    fn n_features(&self) -> Option<usize> {
        Some(self.width())
    }

    fn predict(&self, features: &FeatureMatrix) -> Result<Vec<i64>> {
        if !features.is_empty() && features.cols() != self.width() {
            return Err(PipelineError::schema(format!(
                "model '{}' expects {} features, got {}",
                self.name,
                self.width(),
                features.cols()
            )));
        }

        Ok((0..features.rows())
            .map(|i| argmax(&self.decision_function(features.row(i))) as i64)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model() -> LinearClassifier {
        LinearClassifier::new(
            "linear",
            vec![vec![1.0, 0.0], vec![0.0, 1.0], vec![0.5, 0.5]],
            vec![0.0, 0.0, 0.1],
        )
        .unwrap()
    }

    #[test]
    fn test_argmax_ties_resolve_low() {
        assert_eq!(argmax(&[0.2, 0.7, 0.7]), 1);
        assert_eq!(argmax(&[1.0]), 0);
    }

    #[test]
    fn test_predict() {
        let features =
            FeatureMatrix::from_rows(vec![vec![2.0, 0.0], vec![0.0, 3.0], vec![1.0, 1.0]]).unwrap();
        let predictions = model().predict(&features).unwrap();
        assert_eq!(predictions, vec![0, 1, 2]);
    }

    #[test]
    fn test_width_mismatch() {
        let features = FeatureMatrix::from_rows(vec![vec![1.0, 2.0, 3.0]]).unwrap();
        assert!(matches!(
            model().predict(&features),
            Err(PipelineError::SchemaMismatch(_))
        ));
    }

    #[test]
    fn test_invalid_shapes_rejected() {
        assert!(LinearClassifier::new("m", vec![], vec![]).is_err());
        assert!(LinearClassifier::new("m", vec![vec![1.0]], vec![0.0, 1.0]).is_err());
        let ragged = vec![vec![1.0], vec![1.0, 2.0]];
        assert!(LinearClassifier::new("m", ragged, vec![0.0, 1.0]).is_err());
    }
}
