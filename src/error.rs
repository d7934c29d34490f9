//! Error handling for GNSS position matching.
//!
//! Provides error types with context for reference track loading,
//! timestamp and coordinate parsing, and output generation failures.

use chrono::NaiveDateTime;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CorrectionError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Required column '{column}' not found in {path}")]
    MissingColumn { path: PathBuf, column: String },

    #[error("Could not parse {field} '{value}': {reason}")]
    Parse {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Malformed {field} '{value}': {reason}")]
    Format {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Instant {instant} is outside the reference track ({begin} to {end})")]
    OutOfRange {
        instant: NaiveDateTime,
        begin: NaiveDateTime,
        end: NaiveDateTime,
    },

    #[error(
        "None of the {records} records fall inside the reference track span ({begin} to {end}); check that both instruments logged at the same time"
    )]
    NoOverlap {
        records: usize,
        begin: NaiveDateTime,
        end: NaiveDateTime,
    },

    #[error("Invalid row in {path} at line {line}: {reason}")]
    InvalidRow {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    #[error("Failed to write output {path}: {reason}")]
    OutputFailed { path: PathBuf, reason: String },
}

impl CorrectionError {
    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a parse error for a field that is not a recognisable date, time or number
    pub fn parse(
        field: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::Parse {
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Create a format error for a field that does not have its fixed textual shape
    pub fn format(
        field: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::Format {
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Attach file and line context to a row-level failure
    pub fn in_row(self, path: impl Into<PathBuf>, line: usize) -> Self {
        Self::InvalidRow {
            path: path.into(),
            line,
            reason: self.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, CorrectionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_context_keeps_cause() {
        let err = CorrectionError::format("ThisUTCtime", "1711", "expected 6 digits")
            .in_row("magna.csv", 12);
        let message = err.to_string();

        assert!(message.contains("magna.csv"));
        assert!(message.contains("line 12"));
        assert!(message.contains("1711"));
        assert!(message.contains("expected 6 digits"));
    }
}
