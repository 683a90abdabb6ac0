//! Classifier backends

pub mod classifier;
pub mod loader;
pub mod onnx;

pub use classifier::{Classifier, LinearClassifier};
pub use loader::ModelLoader;
pub use onnx::OnnxClassifier;
