//! CSV data source.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use certgen_model::TabularDataset;

use crate::error::{DataError, Result};
use crate::sources::DataSource;

/// Options for CSV parsing
#[derive(Debug, Clone)]
pub struct CsvOptions {
    /// Field delimiter (default: comma)
    pub delimiter: u8,
    /// Quote character (default: double quote)
    pub quote: u8,
    /// Whether to trim whitespace from fields
    pub trim: bool,
    /// Whether to allow rows with a different cell count than the header
    pub flexible: bool,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            quote: b'"',
            trim: true,
            flexible: true,
        }
    }
}

impl CsvOptions {
    /// Create options for tab-separated values (TSV)
    pub fn tsv() -> Self {
        Self {
            delimiter: b'\t',
            ..Default::default()
        }
    }
}

/// CSV file data source
pub struct CsvSource {
    path: PathBuf,
    options: CsvOptions,
}

impl CsvSource {
    /// Create a new CSV source from a file path
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        Self::with_options(path, CsvOptions::default())
    }

    /// Create a new CSV source with custom options
    pub fn with_options(path: impl AsRef<Path>, options: CsvOptions) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(DataError::FileNotFound(path.display().to_string()));
        }

        Ok(Self {
            path: path.to_path_buf(),
            options,
        })
    }

    /// Read all rows from the CSV file, header included
    pub fn read_all(&self) -> Result<Vec<Vec<String>>> {
        let file = File::open(&self.path)?;
        let reader = BufReader::new(file);

        let mut csv_reader = csv::ReaderBuilder::new()
            .delimiter(self.options.delimiter)
            .quote(self.options.quote)
            .has_headers(false) // the header is row 0 of the grid
            .trim(if self.options.trim {
                csv::Trim::All
            } else {
                csv::Trim::None
            })
            .flexible(self.options.flexible)
            .from_reader(reader);

        let mut result = Vec::new();
        for record in csv_reader.records() {
            let record = record?;
            result.push(record.iter().map(str::to_string).collect());
        }

        Ok(result)
    }
}

impl DataSource for CsvSource {
    fn read_table(&self) -> Result<TabularDataset> {
        Ok(TabularDataset::new(self.read_all()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_test_csv(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_csv_read_all() {
        let file = create_test_csv("name,date,course\nJohn Doe,2023-10-01,Mathematics\n");

        let source = CsvSource::new(file.path()).unwrap();
        let data = source.read_all().unwrap();

        assert_eq!(data.len(), 2);
        assert_eq!(data[0], vec!["name", "date", "course"]);
        assert_eq!(data[1], vec!["John Doe", "2023-10-01", "Mathematics"]);
    }

    #[test]
    fn test_csv_read_table() {
        let file = create_test_csv("name,course\nAlice,Physics\nBob,Chemistry\n");

        let table = CsvSource::new(file.path()).unwrap().read_table().unwrap();
        assert_eq!(table.record_count(), 2);
        assert_eq!(table.cell(1, "course"), Some("Chemistry"));
    }

    #[test]
    fn test_csv_tsv() {
        let file = create_test_csv("Name\tAge\tScore\nAlice\t30\t95\n");

        let source = CsvSource::with_options(file.path(), CsvOptions::tsv()).unwrap();
        let data = source.read_all().unwrap();

        assert_eq!(data.len(), 2);
        assert_eq!(data[0], vec!["Name", "Age", "Score"]);
    }

    #[test]
    fn test_csv_custom_delimiter() {
        let file = create_test_csv("Name;Age;Score\nAlice;30;95\n");

        let options = CsvOptions {
            delimiter: b';',
            ..Default::default()
        };
        let source = CsvSource::with_options(file.path(), options).unwrap();
        let data = source.read_all().unwrap();

        assert_eq!(data[0], vec!["Name", "Age", "Score"]);
    }

    #[test]
    fn test_csv_quoted_fields() {
        let csv_content = r#"Name,Description
"Alice","A ""quoted"" value"
"Bob","Value with, comma"
"#;
        let file = create_test_csv(csv_content);

        let data = CsvSource::new(file.path()).unwrap().read_all().unwrap();

        assert_eq!(data.len(), 3);
        assert_eq!(data[1][1], r#"A "quoted" value"#);
        assert_eq!(data[2][1], "Value with, comma");
    }

    #[test]
    fn test_csv_short_rows_are_kept() {
        let file = create_test_csv("name,date,course\nJane,2023-10-02\n");

        let data = CsvSource::new(file.path()).unwrap().read_all().unwrap();
        assert_eq!(data[1], vec!["Jane", "2023-10-02"]);
    }

    #[test]
    fn test_csv_strict_rejects_ragged_rows() {
        let file = create_test_csv("a,b\n1\n");
        let options = CsvOptions {
            flexible: false,
            ..Default::default()
        };

        let source = CsvSource::with_options(file.path(), options).unwrap();
        assert!(matches!(source.read_all(), Err(DataError::Csv(_))));
    }

    #[test]
    fn test_csv_file_not_found() {
        let result = CsvSource::new("/nonexistent/path/file.csv");
        assert!(matches!(result, Err(DataError::FileNotFound(_))));
    }

    #[test]
    fn test_csv_trim_whitespace() {
        let file = create_test_csv("Name , Age \n Alice , 30 \n");

        let data = CsvSource::new(file.path()).unwrap().read_all().unwrap();

        assert_eq!(data[0], vec!["Name", "Age"]);
        assert_eq!(data[1], vec!["Alice", "30"]);
    }
}
