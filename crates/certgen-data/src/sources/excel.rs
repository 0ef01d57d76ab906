//! Spreadsheet data source using calamine.
//!
//! Handles `.xlsx`, `.xlsm`, `.xls` and `.ods` workbooks. The recipient grid is
//! the used range of one worksheet, the first one unless a sheet is named.

use std::path::{Path, PathBuf};

use calamine::{open_workbook_auto, Data, Range, Reader};
use certgen_model::TabularDataset;

use crate::error::{DataError, Result};
use crate::sources::DataSource;

/// Spreadsheet workbook data source
pub struct ExcelSource {
    path: PathBuf,
    /// Sheet names cache
    sheet_names: Vec<String>,
    /// Sheet to read; defaults to the first one
    sheet: Option<String>,
}

impl ExcelSource {
    /// Open a workbook, reading its sheet names
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(DataError::FileNotFound(path.display().to_string()));
        }

        let workbook = open_workbook_auto(path)
            .map_err(|e| DataError::WorkbookOpen(format!("{}: {}", path.display(), e)))?;
        let sheet_names = workbook.sheet_names().to_vec();

        Ok(Self {
            path: path.to_path_buf(),
            sheet_names,
            sheet: None,
        })
    }

    /// Read the named sheet instead of the first one
    pub fn with_sheet(mut self, sheet: impl Into<String>) -> Self {
        self.sheet = Some(sheet.into());
        self
    }

    /// Name of the sheet that `read_table` will use
    pub fn selected_sheet(&self) -> Option<&str> {
        self.sheet
            .as_deref()
            .or_else(|| self.sheet_names.first().map(String::as_str))
    }

    /// Convert a calamine cell to a string
    fn cell_to_string(cell: &Data) -> String {
        match cell {
            Data::Empty => String::new(),
            Data::String(s) => s.clone(),
            Data::Int(i) => i.to_string(),
            Data::Float(f) => {
                // Whole numbers (ids, years) read back without a decimal part
                if f.fract() == 0.0 {
                    format!("{:.0}", f)
                } else {
                    f.to_string()
                }
            }
            Data::Bool(b) => b.to_string(),
            Data::Error(e) => format!("#ERROR: {:?}", e),
            Data::DateTime(dt) => format!("{}", dt),
            Data::DateTimeIso(s) => s.clone(),
            Data::DurationIso(s) => s.clone(),
        }
    }

    /// Turn a worksheet range into rows, dropping rows that are entirely empty
    fn range_to_rows(range: &Range<Data>) -> Vec<Vec<String>> {
        range
            .rows()
            .map(|row| row.iter().map(Self::cell_to_string).collect::<Vec<_>>())
            .filter(|row| row.iter().any(|cell| !cell.is_empty()))
            .collect()
    }
}

impl DataSource for ExcelSource {
    fn read_table(&self) -> Result<TabularDataset> {
        let sheet = self
            .selected_sheet()
            .ok_or_else(|| DataError::SheetNotFound("No sheets in workbook".to_string()))?
            .to_string();
        if !self.sheet_names.contains(&sheet) {
            return Err(DataError::SheetNotFound(format!(
                "{} (available: {})",
                sheet,
                self.sheet_names.join(", ")
            )));
        }

        // calamine needs a fresh handle for each read
        let mut workbook = open_workbook_auto(&self.path)
            .map_err(|e| DataError::WorkbookOpen(format!("{}: {}", self.path.display(), e)))?;

        let range = workbook
            .worksheet_range(&sheet)
            .map_err(|e| DataError::SheetNotFound(format!("{}: {}", sheet, e)))?;

        Ok(TabularDataset::new(Self::range_to_rows(&range)))
    }
}
