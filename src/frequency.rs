//! Menu item frequency feature.
//!
//! The frequency table is produced offline alongside the classifier and maps
//! each menu item name seen during training to its occurrence frequency.
//! Items absent from the table encode as `0.0`.

use crate::error::{read_json_artifact, PipelineError, Result};
use crate::types::InferenceRequest;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Immutable menu item -> frequency lookup.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrequencyTable {
    entries: HashMap<String, f64>,
}

impl FrequencyTable {
    /// Value used for items that never appeared in training.
    pub const UNSEEN: f64 = 0.0;

    /// Build a table from in-memory entries, rejecting negative or non-finite values.
    pub fn new(entries: HashMap<String, f64>) -> std::result::Result<Self, String> {
        if let Some((item, value)) = entries
            .iter()
            .find(|(_, v)| !v.is_finite() || **v < 0.0)
        {
            return Err(format!("invalid frequency {} for '{}'", value, item));
        }
        Ok(Self { entries })
    }

    /// Load a JSON object of `{ "item name": frequency }`.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let entries: HashMap<String, f64> = read_json_artifact("frequency table", path)?;
        let table = Self::new(entries)
            .map_err(|e| PipelineError::missing("frequency table", path, e))?;

        info!(
            path = %path.display(),
            entries = table.len(),
            "Frequency table loaded"
        );

        Ok(table)
    }

    /// Stored frequency for `item`, or `0.0` when unseen. Keys are case-sensitive.
    pub fn get(&self, item: &str) -> f64 {
        self.entries.get(item).copied().unwrap_or(Self::UNSEEN)
    }

    pub fn contains(&self, item: &str) -> bool {
        self.entries.contains_key(item)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Derives the single `MenuItem_freq` feature column from a batch of requests.
#[derive(Debug, Clone)]
pub struct FrequencyEncoder {
    table: Arc<FrequencyTable>,
}

impl FrequencyEncoder {
    pub const FEATURE_NAME: &'static str = "MenuItem_freq";

    pub fn new(table: Arc<FrequencyTable>) -> Self {
        Self { table }
    }

    /// One frequency per request, in input order.
    pub fn encode(&self, requests: &[InferenceRequest]) -> Vec<f32> {
        requests
            .iter()
            .map(|r| self.encode_value(&r.menu_item))
            .collect()
    }

    /// Frequency of an arbitrary key.
    pub fn encode_value(&self, key: &str) -> f32 {
        self.table.get(key) as f32
    }

    pub fn table(&self) -> &FrequencyTable {
        &self.table
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn table() -> Arc<FrequencyTable> {
        let mut entries = HashMap::new();
        entries.insert("Newyork Cheesecake".to_string(), 0.0125);
        entries.insert("Tiramisu".to_string(), 0.03);
        Arc::new(FrequencyTable::new(entries).unwrap())
    }

    fn request(item: &str) -> InferenceRequest {
        InferenceRequest::new("R003", "Desserts", "Chocolate Butter Sugar Eggs", item, 18.66)
    }

    #[test]
    fn test_known_items_return_stored_value() {
        let table = table();
        assert_eq!(table.get("Newyork Cheesecake"), 0.0125);
        assert_eq!(table.get("Tiramisu"), 0.03);
    }

    #[test]
    fn test_unknown_items_default_to_zero() {
        let table = table();
        assert_eq!(table.get("Zzzz Unknown Item"), 0.0);
        // Case-sensitive keys
        assert_eq!(table.get("tiramisu"), 0.0);
    }

    #[test]
    fn test_encode_preserves_order_and_input() {
        let encoder = FrequencyEncoder::new(table());
        let requests = vec![
            request("Tiramisu"),
            request("Zzzz Unknown Item"),
            request("Newyork Cheesecake"),
        ];
        let before = requests.clone();

        let column = encoder.encode(&requests);

        assert_eq!(column, vec![0.03_f32, 0.0, 0.0125_f32]);
        assert_eq!(requests, before);
    }

    #[test]
    fn test_rejects_negative_frequency() {
        let mut entries = HashMap::new();
        entries.insert("Bad".to_string(), -1.0);
        assert!(FrequencyTable::new(entries).is_err());
    }

    #[test]
    fn test_load_from_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"Newyork Cheesecake": 0.5, "Tiramisu": 2}}"#).unwrap();

        let table = FrequencyTable::load(file.path()).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.get("Tiramisu"), 2.0);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = FrequencyTable::load(dir.path().join("menu_item_freq.json")).unwrap_err();
        assert!(err.is_artifact_missing());
    }

    #[test]
    fn test_load_invalid_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();

        let err = FrequencyTable::load(file.path()).unwrap_err();
        assert!(err.is_artifact_missing());
    }
}
