//! # certgen-data
//!
//! Recipient readers for certgen: turn a CSV, TSV or spreadsheet file into a
//! [`TabularDataset`] whose first row is the field names.
//!
//! ## Example
//!
//! ```rust,ignore
//! use certgen_data::read_recipients;
//!
//! let data = read_recipients("recipients.csv")?;
//! println!("{} recipients", data.record_count());
//! ```

pub mod error;
pub mod sources;

use std::path::Path;

use certgen_model::TabularDataset;
use tracing::debug;

// Re-exports
pub use error::{DataError, Result};
pub use sources::{CsvOptions, CsvSource, DataSource, ExcelSource};

/// Recipient file formats, selected by file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecipientFormat {
    Csv,
    Tsv,
    Spreadsheet,
}

impl RecipientFormat {
    /// Detect the format from the extension (case-insensitive)
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        match ext.as_str() {
            "csv" => Ok(RecipientFormat::Csv),
            "tsv" => Ok(RecipientFormat::Tsv),
            "xlsx" | "xlsm" | "xls" | "ods" => Ok(RecipientFormat::Spreadsheet),
            _ => Err(DataError::UnsupportedFormat(path.display().to_string())),
        }
    }
}

/// Options refining how a recipients file is read
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReadOptions {
    /// Worksheet to read from a spreadsheet; the first one when unset
    pub sheet: Option<String>,
}

impl ReadOptions {
    pub fn with_sheet(mut self, sheet: impl Into<String>) -> Self {
        self.sheet = Some(sheet.into());
        self
    }
}

/// Read a recipients file into a dataset.
///
/// The format is checked before the file is touched, so an unsupported
/// extension fails even when the file does not exist.
pub fn read_recipients(path: impl AsRef<Path>) -> Result<TabularDataset> {
    read_recipients_with(path, &ReadOptions::default())
}

/// Read a recipients file with explicit options.
///
/// A sheet name is ignored for CSV and TSV files.
pub fn read_recipients_with(
    path: impl AsRef<Path>,
    options: &ReadOptions,
) -> Result<TabularDataset> {
    let path = path.as_ref();
    let format = RecipientFormat::from_path(path)?;
    debug!(path = %path.display(), ?format, "reading recipients");

    let data = match format {
        RecipientFormat::Csv => CsvSource::new(path)?.read_table()?,
        RecipientFormat::Tsv => CsvSource::with_options(path, CsvOptions::tsv())?.read_table()?,
        RecipientFormat::Spreadsheet => {
            let mut source = ExcelSource::new(path)?;
            if let Some(sheet) = &options.sheet {
                source = source.with_sheet(sheet.as_str());
            }
            source.read_table()?
        }
    };

    debug!(records = data.record_count(), "recipients loaded");
    Ok(data)
}
