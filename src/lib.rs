//! Menu Profitability Predictor
//!
//! Predicts the profitability label of a restaurant menu item by running it
//! through a trained preprocessor, classifier and label encoder that are
//! loaded once and shared read-only.

pub mod artifacts;
pub mod config;
pub mod consumer;
pub mod error;
pub mod frequency;
pub mod label_encoder;
pub mod metrics;
pub mod models;
pub mod pipeline;
pub mod preprocess;
pub mod producer;
pub mod types;

pub use artifacts::{ArtifactCache, Artifacts};
pub use config::AppConfig;
pub use consumer::RequestConsumer;
pub use error::{PipelineError, Result};
pub use frequency::{FrequencyEncoder, FrequencyTable};
pub use label_encoder::LabelEncoder;
pub use pipeline::InferencePipeline;
pub use preprocess::{ColumnTransformer, FeatureMatrix, Preprocessor};
pub use producer::ResponseProducer;
pub use types::{InferenceRequest, InferenceResponse};
