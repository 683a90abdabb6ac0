//! Trained artifacts shared by every inference call.
//!
//! Artifacts are loaded once and never mutated afterwards. [`Artifacts`] is
//! handed to the pipeline as an `Arc`, so tests can build one from substitute
//! parts instead of files on disk.

use crate::config::ArtifactsConfig;
use crate::error::Result;
use crate::frequency::FrequencyTable;
use crate::label_encoder::LabelEncoder;
use crate::models::{Classifier, ModelLoader};
use crate::preprocess::{ColumnTransformer, Preprocessor};
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tracing::info;

/// The frequency table, preprocessor, label encoder and classifier.
pub struct Artifacts {
    frequency: Arc<FrequencyTable>,
    preprocessor: Box<dyn Preprocessor>,
    label_encoder: LabelEncoder,
    classifier: Box<dyn Classifier>,
}

impl Artifacts {
    /// Load all artifacts from the configured directory.
    pub fn load(config: &ArtifactsConfig) -> Result<Arc<Self>> {
        let start = Instant::now();

        let frequency = Arc::new(FrequencyTable::load(config.frequency_table_path())?);
        let preprocessor = ColumnTransformer::load(config.preprocessor_path(), frequency.clone())?;
        let label_encoder = LabelEncoder::load(config.label_encoder_path())?;
        let classifier = ModelLoader::with_threads(config.onnx_threads)
            .load_classifier(config.classifier_path())?;

        info!(
            dir = %config.dir,
            n_features = preprocessor.n_features(),
            classes = label_encoder.len(),
            model = %classifier.name(),
            load_ms = start.elapsed().as_millis() as u64,
            "Artifacts loaded"
        );

        Ok(Arc::new(Self::from_parts(
            frequency,
            Box::new(preprocessor),
            label_encoder,
            classifier,
        )))
    }

    /// Assemble artifacts that were built in memory.
    pub fn from_parts(
        frequency: Arc<FrequencyTable>,
        preprocessor: Box<dyn Preprocessor>,
        label_encoder: LabelEncoder,
        classifier: Box<dyn Classifier>,
    ) -> Self {
        Self {
            frequency,
            preprocessor,
            label_encoder,
            classifier,
        }
    }

    pub fn frequency(&self) -> &FrequencyTable {
        &self.frequency
    }

    pub fn preprocessor(&self) -> &dyn Preprocessor {
        self.preprocessor.as_ref()
    }

    pub fn label_encoder(&self) -> &LabelEncoder {
        &self.label_encoder
    }

    pub fn classifier(&self) -> &dyn Classifier {
        self.classifier.as_ref()
    }
}

/// Lazily loads [`Artifacts`] on first use and hands out the same `Arc` afterwards.
///
/// A failed load leaves the cache empty, so the next call tries again.
pub struct ArtifactCache {
    config: ArtifactsConfig,
    loaded: Mutex<Option<Arc<Artifacts>>>,
}

impl ArtifactCache {
    pub fn new(config: ArtifactsConfig) -> Self {
        Self {
            config,
            loaded: Mutex::new(None),
        }
    }

    pub fn get_or_load(&self) -> Result<Arc<Artifacts>> {
        let mut loaded = self
            .loaded
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if let Some(artifacts) = loaded.as_ref() {
            return Ok(artifacts.clone());
        }

        let artifacts = Artifacts::load(&self.config)?;
        *loaded = Some(artifacts.clone());
        Ok(artifacts)
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
            .lock()
            .map(|loaded| loaded.is_some())
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn demo_config() -> ArtifactsConfig {
        ArtifactsConfig {
            dir: concat!(env!("CARGO_MANIFEST_DIR"), "/artifacts").to_string(),
            ..ArtifactsConfig::default()
        }
    }

    #[test]
    fn test_load_bundled_artifacts() {
        let artifacts = Artifacts::load(&demo_config()).unwrap();
        assert_eq!(
            artifacts.classifier().n_features(),
            Some(artifacts.preprocessor().n_features())
        );
        assert_eq!(artifacts.label_encoder().classes(), &["High", "Low", "Medium"]);
        assert!(artifacts.frequency().contains("Newyork Cheesecake"));
    }

    #[test]
    fn test_cache_loads_once() {
        let cache = ArtifactCache::new(demo_config());
        assert!(!cache.is_loaded());

        let first = cache.get_or_load().unwrap();
        let second = cache.get_or_load().unwrap();

        assert!(cache.is_loaded());
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_missing_directory_is_artifact_missing() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ArtifactCache::new(ArtifactsConfig {
            dir: dir.path().display().to_string(),
            ..ArtifactsConfig::default()
        });

        let err = cache.get_or_load().err().unwrap();
        assert!(err.is_artifact_missing());
        assert!(!cache.is_loaded());
    }
}
