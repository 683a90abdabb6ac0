//! Request and response types for menu profitability inference

pub mod request;
pub mod response;

pub use request::{FieldValue, InferenceRequest};
pub use response::InferenceResponse;
