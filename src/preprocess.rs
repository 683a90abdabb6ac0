//! Feature preprocessing for profitability inference.
//!
//! The preprocessor is a column transformer exported from the training
//! pipeline as JSON. Each stage reads one request column and writes a fixed
//! number of feature columns; stages are concatenated in definition order,
//! which must match the column order the classifier was trained on.

use crate::error::{read_json_artifact, PipelineError, Result};
use crate::frequency::{FrequencyEncoder, FrequencyTable};
use crate::types::{FieldValue, InferenceRequest};
use regex::Regex;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, LazyLock};
use tracing::{debug, info};

/// scikit-learn's default `token_pattern`: words of two or more characters.
static TOKEN_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\w\w+\b").expect("valid token pattern"));

/// Row-major dense feature matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    rows: usize,
    cols: usize,
    data: Vec<f32>,
}

impl FeatureMatrix {
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: vec![0.0; rows * cols],
        }
    }

    /// Build from equally sized rows.
    pub fn from_rows(rows: Vec<Vec<f32>>) -> Result<Self> {
        let cols = rows.first().map(Vec::len).unwrap_or(0);
        if let Some(bad) = rows.iter().position(|r| r.len() != cols) {
            return Err(PipelineError::schema(format!(
                "row {} has {} features, expected {}",
                bad,
                rows[bad].len(),
                cols
            )));
        }
        let n_rows = rows.len();
        Ok(Self {
            rows: n_rows,
            cols,
            data: rows.into_iter().flatten().collect(),
        })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn row(&self, index: usize) -> &[f32] {
        &self.data[index * self.cols..(index + 1) * self.cols]
    }

    fn row_mut(&mut self, index: usize) -> &mut [f32] {
        &mut self.data[index * self.cols..(index + 1) * self.cols]
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }
}

/// A trained transform from raw requests to classifier features.
pub trait Preprocessor: Send + Sync {
    /// Width of every output row.
    fn n_features(&self) -> usize;

    /// Transform a batch; row `i` of the result corresponds to `batch[i]`.
    fn transform(&self, batch: &[InferenceRequest]) -> Result<FeatureMatrix>;
}

/// Row normalisation applied after tf-idf weighting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Norm {
    L2,
}

fn default_lowercase() -> bool {
    true
}

/// One column transformer stage as serialized by the training pipeline.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StageDefinition {
    /// One indicator column per known category; unknown categories encode as all zeros.
    OneHot {
        column: String,
        categories: Vec<String>,
    },
    /// `(x - mean) / scale`
    StandardScaler { column: String, mean: f64, scale: f64 },
    /// Bag of words over a fixed vocabulary, optionally idf weighted and normalised.
    Tfidf {
        column: String,
        vocabulary: Vec<String>,
        #[serde(default)]
        idf: Option<Vec<f64>>,
        #[serde(default = "default_lowercase")]
        lowercase: bool,
        #[serde(default)]
        norm: Option<Norm>,
    },
    /// Frequency table lookup.
    Frequency { column: String },
    /// Numeric column copied unchanged.
    Passthrough { column: String },
}

impl StageDefinition {
    fn column(&self) -> &str {
        match self {
            Self::OneHot { column, .. }
            | Self::StandardScaler { column, .. }
            | Self::Tfidf { column, .. }
            | Self::Frequency { column }
            | Self::Passthrough { column } => column,
        }
    }
}

/// Serialized preprocessor artifact.
#[derive(Debug, Clone, Deserialize)]
pub struct PreprocessorDefinition {
    pub transformers: Vec<StageDefinition>,
}

#[derive(Debug)]
enum Stage {
    OneHot {
        column: String,
        index: HashMap<String, usize>,
        width: usize,
    },
    Scaler {
        column: String,
        mean: f64,
        scale: f64,
    },
    Tfidf {
        column: String,
        vocabulary: HashMap<String, usize>,
        idf: Option<Vec<f64>>,
        lowercase: bool,
        norm: Option<Norm>,
    },
    Frequency {
        column: String,
    },
    Passthrough {
        column: String,
    },
}

impl Stage {
    fn compile(definition: StageDefinition) -> std::result::Result<Self, String> {
        if !InferenceRequest::has_column(definition.column()) {
            return Err(format!("unknown column '{}'", definition.column()));
        }

        let stage = match definition {
            StageDefinition::OneHot { column, categories } => {
                let width = categories.len();
                let index: HashMap<String, usize> = categories
                    .into_iter()
                    .enumerate()
                    .map(|(i, c)| (c, i))
                    .collect();
                if index.len() != width {
                    return Err(format!("duplicate categories for column '{}'", column));
                }
                Stage::OneHot {
                    column,
                    index,
                    width,
                }
            }
            StageDefinition::StandardScaler {
                column,
                mean,
                scale,
            } => {
                if !mean.is_finite() || !scale.is_finite() {
                    return Err(format!("non-finite scaler parameters for '{}'", column));
                }
                // scikit-learn replaces zero variance with unit scale
                let scale = if scale == 0.0 { 1.0 } else { scale };
                Stage::Scaler {
                    column,
                    mean,
                    scale,
                }
            }
            StageDefinition::Tfidf {
                column,
                vocabulary,
                idf,
                lowercase,
                norm,
            } => {
                if let Some(idf) = &idf {
                    if idf.len() != vocabulary.len() {
                        return Err(format!(
                            "idf has {} weights for {} terms in '{}'",
                            idf.len(),
                            vocabulary.len(),
                            column
                        ));
                    }
                }
                let terms = vocabulary.len();
                let vocabulary: HashMap<String, usize> = vocabulary
                    .into_iter()
                    .enumerate()
                    .map(|(i, t)| (t, i))
                    .collect();
                if vocabulary.len() != terms {
                    return Err(format!("duplicate vocabulary terms for '{}'", column));
                }
                Stage::Tfidf {
                    column,
                    vocabulary,
                    idf,
                    lowercase,
                    norm,
                }
            }
            StageDefinition::Frequency { column } => Stage::Frequency { column },
            StageDefinition::Passthrough { column } => Stage::Passthrough { column },
        };

        Ok(stage)
    }

    fn width(&self) -> usize {
        match self {
            Stage::OneHot { width, .. } => *width,
            Stage::Tfidf { vocabulary, .. } => vocabulary.len(),
            Stage::Scaler { .. } | Stage::Frequency { .. } | Stage::Passthrough { .. } => 1,
        }
    }

    fn column(&self) -> &str {
        match self {
            Stage::OneHot { column, .. }
            | Stage::Scaler { column, .. }
            | Stage::Tfidf { column, .. }
            | Stage::Frequency { column }
            | Stage::Passthrough { column } => column,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Stage::OneHot { .. } => "one_hot",
            Stage::Scaler { .. } => "standard_scaler",
            Stage::Tfidf { .. } => "tfidf",
            Stage::Frequency { .. } => "frequency",
            Stage::Passthrough { .. } => "passthrough",
        }
    }

    fn text<'a>(&self, request: &'a InferenceRequest) -> Result<&'a str> {
        match request.field(self.column()) {
            Some(FieldValue::Text(text)) => Ok(text),
            Some(FieldValue::Number(_)) => Err(PipelineError::schema(format!(
                "{} stage expects text column '{}', found a number",
                self.kind(),
                self.column()
            ))),
            None => Err(PipelineError::schema(format!(
                "column '{}' not present in request",
                self.column()
            ))),
        }
    }

    fn number(&self, request: &InferenceRequest) -> Result<f64> {
        match request.field(self.column()) {
            Some(FieldValue::Number(value)) => Ok(value),
            Some(FieldValue::Text(_)) => Err(PipelineError::schema(format!(
                "{} stage expects numeric column '{}', found text",
                self.kind(),
                self.column()
            ))),
            None => Err(PipelineError::schema(format!(
                "column '{}' not present in request",
                self.column()
            ))),
        }
    }

    /// Write this stage's features for `request` into `out` (exactly `width()` slots).
    fn apply(
        &self,
        request: &InferenceRequest,
        frequency: &FrequencyEncoder,
        out: &mut [f32],
    ) -> Result<()> {
        match self {
            Stage::OneHot { index, .. } => {
                if let Some(&i) = index.get(self.text(request)?) {
                    out[i] = 1.0;
                }
            }
            Stage::Scaler { mean, scale, .. } => {
                let value = self.number(request)?;
                out[0] = ((value - mean) / scale) as f32;
            }
            Stage::Tfidf {
                vocabulary,
                idf,
                lowercase,
                norm,
                ..
            } => {
                let text = self.text(request)?;
                let text = if *lowercase {
                    text.to_lowercase()
                } else {
                    text.to_string()
                };

                for token in TOKEN_PATTERN.find_iter(&text) {
                    if let Some(&i) = vocabulary.get(token.as_str()) {
                        out[i] += 1.0;
                    }
                }

                if let Some(idf) = idf {
                    for (value, weight) in out.iter_mut().zip(idf) {
                        *value *= *weight as f32;
                    }
                }

                if *norm == Some(Norm::L2) {
                    let length = out.iter().map(|v| v * v).sum::<f32>().sqrt();
                    if length > 0.0 {
                        out.iter_mut().for_each(|v| *v /= length);
                    }
                }
            }
            Stage::Frequency { .. } => {
                out[0] = frequency.encode_value(self.text(request)?);
            }
            Stage::Passthrough { .. } => {
                out[0] = self.number(request)? as f32;
            }
        }
        Ok(())
    }
}

/// Column transformer loaded from a JSON preprocessor artifact.
#[derive(Debug)]
pub struct ColumnTransformer {
    stages: Vec<Stage>,
    frequency: FrequencyEncoder,
    n_features: usize,
}

impl ColumnTransformer {
    /// Compile a definition against a loaded frequency table.
    pub fn new(
        definition: PreprocessorDefinition,
        frequency: Arc<FrequencyTable>,
    ) -> std::result::Result<Self, String> {
        if definition.transformers.is_empty() {
            return Err("preprocessor defines no transformers".to_string());
        }

        let stages = definition
            .transformers
            .into_iter()
            .map(Stage::compile)
            .collect::<std::result::Result<Vec<_>, _>>()?;
        let n_features = stages.iter().map(Stage::width).sum();

        Ok(Self {
            stages,
            frequency: FrequencyEncoder::new(frequency),
            n_features,
        })
    }

    /// Load a preprocessor artifact.
    pub fn load<P: AsRef<Path>>(path: P, frequency: Arc<FrequencyTable>) -> Result<Self> {
        let path = path.as_ref();
        let definition: PreprocessorDefinition = read_json_artifact("preprocessor", path)?;
        let transformer = Self::new(definition, frequency)
            .map_err(|e| PipelineError::missing("preprocessor", path, e))?;

        info!(
            path = %path.display(),
            stages = transformer.stages.len(),
            n_features = transformer.n_features,
            "Preprocessor loaded"
        );

        Ok(transformer)
    }

    /// Feature names in output order (`column=category`, `column:term`, or the column name).
    pub fn feature_names(&self) -> Vec<String> {
        let mut names = Vec::with_capacity(self.n_features);
        for stage in &self.stages {
            match stage {
                Stage::OneHot { column, index, width } => {
                    let mut by_position = vec![String::new(); *width];
                    for (category, &i) in index {
                        by_position[i] = format!("{}={}", column, category);
                    }
                    names.extend(by_position);
                }
                Stage::Tfidf {
                    column, vocabulary, ..
                } => {
                    let mut by_position = vec![String::new(); vocabulary.len()];
                    for (term, &i) in vocabulary {
                        by_position[i] = format!("{}:{}", column, term);
                    }
                    names.extend(by_position);
                }
                Stage::Frequency { column } if column == "MenuItem" => {
                    names.push(FrequencyEncoder::FEATURE_NAME.to_string());
                }
                other => names.push(other.column().to_string()),
            }
        }
        names
    }

    fn validate(request: &InferenceRequest, row: usize) -> Result<()> {
        if !request.price.is_finite() || request.price < 0.0 {
            return Err(PipelineError::schema(format!(
                "row {}: Price must be a non-negative number, got {}",
                row, request.price
            )));
        }
        Ok(())
    }
}

impl Preprocessor for ColumnTransformer {
    fn n_features(&self) -> usize {
        self.n_features
    }

    fn transform(&self, batch: &[InferenceRequest]) -> Result<FeatureMatrix> {
        let mut matrix = FeatureMatrix::zeros(batch.len(), self.n_features);

        for (row, request) in batch.iter().enumerate() {
            Self::validate(request, row)?;

            let out = matrix.row_mut(row);
            let mut offset = 0;
            for stage in &self.stages {
                let width = stage.width();
                stage.apply(request, &self.frequency, &mut out[offset..offset + width])?;
                offset += width;
            }
        }

        debug!(
            rows = matrix.rows(),
            cols = matrix.cols(),
            "Preprocessed batch"
        );

        Ok(matrix)
    }
}
