//! Tabular recipient data
//!
//! A dataset is a grid of text cells. Row 0 holds the field names and every
//! following row is one recipient record.

use serde::{Deserialize, Serialize};

use crate::record::RecordModel;

/// A header row followed by zero or more record rows
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TabularDataset {
    rows: Vec<Vec<String>>,
}

impl TabularDataset {
    /// Create a dataset from raw rows (row 0 is the header)
    pub fn new(rows: Vec<Vec<String>>) -> Self {
        Self { rows }
    }

    /// Build a dataset from string slices, mostly useful in tests
    pub fn from_rows<R, C>(rows: R) -> Self
    where
        R: IntoIterator<Item = C>,
        C: IntoIterator,
        C::Item: Into<String>,
    {
        Self {
            rows: rows
                .into_iter()
                .map(|row| row.into_iter().map(Into::into).collect())
                .collect(),
        }
    }

    /// True when there is not even a header row
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The field names, if a header row exists
    pub fn header(&self) -> Option<&[String]> {
        self.rows.first().map(Vec::as_slice)
    }

    /// Record rows, excluding the header
    pub fn records(&self) -> &[Vec<String>] {
        self.rows.get(1..).unwrap_or(&[])
    }

    /// Number of record rows
    pub fn record_count(&self) -> usize {
        self.rows.len().saturating_sub(1)
    }

    /// Position of a header field
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.header()?.iter().position(|field| field == name)
    }

    /// Value of `column` for record `index` (zero-based, header excluded)
    pub fn cell(&self, index: usize, column: &str) -> Option<&str> {
        let col = self.column_index(column)?;
        self.records().get(index)?.get(col).map(String::as_str)
    }

    /// One model per record, built by zipping the header with each row
    pub fn record_models(&self) -> Vec<RecordModel> {
        let header = self.header().unwrap_or(&[]);
        self.records()
            .iter()
            .map(|row| RecordModel::from_row(header, row))
            .collect()
    }

    /// All rows including the header
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }
}
