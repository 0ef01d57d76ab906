//! Data source implementations.
//!
//! This module contains adapters for the recipient file formats (CSV, TSV and
//! spreadsheets).

pub mod csv;
pub mod excel;

pub use csv::{CsvOptions, CsvSource};
pub use excel::ExcelSource;

use certgen_model::TabularDataset;

use crate::error::Result;

/// Trait for sources that can produce a recipient grid
pub trait DataSource {
    /// Read the whole source: row 0 is the header, every other row a record
    fn read_table(&self) -> Result<TabularDataset>;
}
