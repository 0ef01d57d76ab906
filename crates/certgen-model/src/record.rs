//! Per-record key/value model

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Flat field name → value view of one record
///
/// Keys are kept sorted so that diagnostics listing fields are stable.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordModel(BTreeMap<String, String>);

impl RecordModel {
    /// Create an empty model
    pub fn new() -> Self {
        Self::default()
    }

    /// Zip a header row with a record row.
    ///
    /// Cells beyond the header are ignored and header fields without a cell
    /// are left out, so a short row surfaces later as missing fields.
    pub fn from_row(header: &[String], row: &[String]) -> Self {
        Self(
            header
                .iter()
                .zip(row)
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect(),
        )
    }

    /// Layer this model over run-wide constants; keys in `self` win
    pub fn merged_over(&self, constants: &RecordModel) -> RecordModel {
        let mut merged = constants.0.clone();
        merged.extend(self.0.iter().map(|(k, v)| (k.clone(), v.clone())));
        Self(merged)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for RecordModel {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}
