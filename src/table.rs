//! In-memory tabular data and CSV adapters.
//!
//! [`Table`] is the column-named, string-valued structure consumed and
//! produced by the correctors. Reading skips a fixed number of banner
//! lines before the column-title row; writing goes through a temporary
//! file that is only renamed into place once fully written.

use crate::error::{CorrectionError, Result};
use std::fs::File;
use std::io::{BufRead, BufReader, Read, Write};
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::debug;

/// Column headers plus string-valued rows
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
    /// 1-based source line of each row, when read from a file
    lines: Vec<usize>,
}

impl Table {
    pub fn new(headers: Vec<String>) -> Self {
        Self {
            headers,
            rows: Vec::new(),
            lines: Vec::new(),
        }
    }

    /// Read a CSV file, skipping `skip_lines` raw lines before the header row
    pub fn read_csv(path: &Path, skip_lines: usize) -> Result<Self> {
        let file = File::open(path).map_err(|e| CorrectionError::InvalidRow {
            path: path.to_path_buf(),
            line: 0,
            reason: format!("cannot open file: {}", e),
        })?;
        let table = Self::from_reader(file, skip_lines).map_err(|e| match e {
            CorrectionError::Csv(source) => CorrectionError::InvalidRow {
                path: path.to_path_buf(),
                line: source.position().map_or(0, |p| p.line() as usize + skip_lines),
                reason: source.to_string(),
            },
            other => other,
        })?;

        debug!(
            "Read {} rows x {} columns from {}",
            table.len(),
            table.headers.len(),
            path.display()
        );
        Ok(table)
    }

    /// Parse CSV content from any reader
    pub fn from_reader<R: Read>(reader: R, skip_lines: usize) -> Result<Self> {
        let mut reader = BufReader::new(reader);
        let mut discarded = String::new();
        for _ in 0..skip_lines {
            discarded.clear();
            if reader.read_line(&mut discarded)? == 0 {
                break;
            }
        }

        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = csv_reader
            .headers()?
            .iter()
            .map(|name| name.to_string())
            .collect::<Vec<_>>();

        let mut rows = Vec::new();
        let mut lines = Vec::new();
        for record in csv_reader.records() {
            let record = record?;
            let line = record.position().map_or(0, |p| p.line() as usize) + skip_lines;
            rows.push(record.iter().map(|field| field.to_string()).collect());
            lines.push(line);
        }

        Ok(Self {
            headers,
            rows,
            lines,
        })
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn push_row(&mut self, row: Vec<String>) {
        self.rows.push(row);
        self.lines.push(self.rows.len() + 1);
    }

    /// Source line of `row` for diagnostics
    pub fn line_of(&self, row: usize) -> usize {
        self.lines.get(row).copied().unwrap_or(row + 2)
    }

    /// Index of a column by exact name
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|header| header == name)
    }

    /// Index of a column that must be present
    pub fn require_column(&self, name: &str, source: &Path) -> Result<usize> {
        self.column_index(name)
            .ok_or_else(|| CorrectionError::MissingColumn {
                path: source.to_path_buf(),
                column: name.to_string(),
            })
    }

    /// Field at `row`/`column`, empty when the row is short
    pub fn value(&self, row: usize, column: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|fields| fields.get(column))
            .map_or("", String::as_str)
    }

    /// Remove rows that are short or contain any empty field
    ///
    /// Fields equal to one of `missing` count as empty. Returns the number
    /// of rows removed.
    pub fn drop_incomplete_rows(&mut self, missing: &[String]) -> usize {
        let width = self.headers.len();
        let before = self.rows.len();
        let is_missing = |field: &String| field.is_empty() || missing.contains(field);
        let (rows, lines): (Vec<_>, Vec<_>) = std::mem::take(&mut self.rows)
            .into_iter()
            .zip(std::mem::take(&mut self.lines))
            .filter(|(row, _)| row.len() >= width && !row.iter().take(width).any(is_missing))
            .unzip();
        self.rows = rows;
        self.lines = lines;
        before - self.rows.len()
    }

    /// Write as CSV, replacing `path` only once the whole table is written
    pub fn write_csv_atomic(&self, path: &Path) -> Result<()> {
        let output_failed = |reason: String| CorrectionError::OutputFailed {
            path: path.to_path_buf(),
            reason,
        };

        let directory = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut temp = NamedTempFile::new_in(directory)
            .map_err(|e| output_failed(format!("cannot create temporary file: {}", e)))?;

        {
            let mut writer = csv::Writer::from_writer(temp.as_file_mut());
            writer
                .write_record(&self.headers)
                .map_err(|e| output_failed(e.to_string()))?;
            for row in &self.rows {
                writer
                    .write_record(row)
                    .map_err(|e| output_failed(e.to_string()))?;
            }
            writer.flush().map_err(|e| output_failed(e.to_string()))?;
        }
        temp.as_file_mut()
            .flush()
            .map_err(|e| output_failed(e.to_string()))?;

        temp.persist(path)
            .map_err(|e| output_failed(format!("cannot move output into place: {}", e.error)))?;

        debug!("Wrote {} rows to {}", self.rows.len(), path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const LOGGER: &str = r#""TOA5","CR800","CR800"
"TIMESTAMP","RECORD","DepthCm"
"2023-12-15 17:11:20",1,42.5
"2023-12-15 17:11:21",2,
"2023-12-15 17:11:22",3,40.1
"2023-12-15 17:11:23"
"#;

    #[test]
    fn test_reads_after_banner() {
        let table = Table::from_reader(LOGGER.as_bytes(), 1).unwrap();

        assert_eq!(table.headers(), &["TIMESTAMP", "RECORD", "DepthCm"]);
        assert_eq!(table.len(), 4);
        assert_eq!(table.value(0, 0), "2023-12-15 17:11:20");
        assert_eq!(table.value(3, 2), "");
    }

    #[test]
    fn test_drop_incomplete_rows() {
        let mut table = Table::from_reader(LOGGER.as_bytes(), 1).unwrap();
        let dropped = table.drop_incomplete_rows(&[]);

        assert_eq!(dropped, 2);
        assert_eq!(table.len(), 2);
        assert_eq!(table.value(1, 1), "3");
        assert_eq!(table.line_of(0), 3);
        assert_eq!(table.line_of(1), 5);
    }

    #[test]
    fn test_missing_value_markers_drop_rows() {
        let content = "banner\nTIMESTAMP,latitude_a,DepthCm\n\
                       2023-12-15 17:11:20,45,42.5\n\
                       2023-12-15 17:11:21,NAN,41.0\n\
                       2023-12-15 17:11:22,45,NAN\n\
                       2023-12-15 17:11:23,45,40.1\n";
        let mut table = Table::from_reader(content.as_bytes(), 1).unwrap();
        let dropped = table.drop_incomplete_rows(&["NAN".to_string()]);

        assert_eq!(dropped, 2);
        assert_eq!(table.value(0, 2), "42.5");
        assert_eq!(table.value(1, 2), "40.1");
        assert_eq!(table.line_of(1), 6);
    }

    #[test]
    fn test_require_column_names_source() {
        let table = Table::from_reader(LOGGER.as_bytes(), 1).unwrap();
        let err = table
            .require_column("ThisUTCtime", Path::new("magna.dat"))
            .unwrap_err();

        assert!(matches!(err, CorrectionError::MissingColumn { .. }));
        assert!(err.to_string().contains("magna.dat"));
    }

    #[test]
    fn test_atomic_write_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("out.csv");

        let mut table = Table::new(vec!["a".to_string(), "b".to_string()]);
        table.push_row(vec!["1".to_string(), "x,y".to_string()]);
        table.write_csv_atomic(&path).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written, "a,b\n1,\"x,y\"\n");

        let leftovers = std::fs::read_dir(temp_dir.path()).unwrap().count();
        assert_eq!(leftovers, 1);
    }

    #[test]
    fn test_failed_write_leaves_no_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("missing-dir").join("out.csv");

        let table = Table::new(vec!["a".to_string()]);
        let err = table.write_csv_atomic(&path).unwrap_err();

        assert!(matches!(err, CorrectionError::OutputFailed { .. }));
        assert!(!path.exists());
    }
}
