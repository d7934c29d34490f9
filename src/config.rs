//! Configuration management and validation.
//!
//! Provides configuration structures for the reference track layouts,
//! the leap-second correction and the stream and event matching policies.

use crate::constants::{
    DEFAULT_LEAP_SECONDS, MAX_LEAP_SECONDS, events, fixed_column, output, stream,
    whitespace_report,
};
use crate::error::{CorrectionError, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Column positions of the post-processed kinematic solution log
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixedColumnLayout {
    /// Preamble lines skipped before the column-title line
    pub skip_lines: usize,

    /// Zero-based positions after splitting on single spaces
    pub date_column: usize,
    pub time_column: usize,
    pub latitude_column: usize,
    pub longitude_column: usize,
}

impl Default for FixedColumnLayout {
    fn default() -> Self {
        Self {
            skip_lines: fixed_column::SKIP_LINES,
            date_column: fixed_column::DATE_COLUMN,
            time_column: fixed_column::TIME_COLUMN,
            latitude_column: fixed_column::LATITUDE_COLUMN,
            longitude_column: fixed_column::LONGITUDE_COLUMN,
        }
    }
}

impl FixedColumnLayout {
    /// Number of fields a data row must have
    pub fn min_fields(&self) -> usize {
        [
            self.date_column,
            self.time_column,
            self.latitude_column,
            self.longitude_column,
        ]
        .into_iter()
        .max()
        .unwrap_or(0)
            + 1
    }
}

/// Named columns of the precise point positioning report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhitespaceReportLayout {
    /// Preamble lines skipped before the column-title line
    pub skip_lines: usize,
}

impl Default for WhitespaceReportLayout {
    fn default() -> Self {
        Self {
            skip_lines: whitespace_report::SKIP_LINES,
        }
    }
}

/// Field logger stream settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamConfig {
    /// Banner lines before the column-title line
    pub skip_lines: usize,

    pub timestamp_column: String,
    pub utc_time_column: String,
    pub latitude_degrees_column: String,
    pub latitude_minutes_column: String,
    pub longitude_degrees_column: String,
    pub longitude_minutes_column: String,

    /// Instrument-internal columns removed from output
    pub dropped_columns: Vec<String>,

    /// Field values treated like an empty field
    pub missing_values: Vec<String>,

    pub corrected_latitude_column: String,
    pub corrected_longitude_column: String,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            skip_lines: stream::SKIP_LINES,
            timestamp_column: stream::TIMESTAMP_COLUMN.to_string(),
            utc_time_column: stream::UTC_TIME_COLUMN.to_string(),
            latitude_degrees_column: stream::LATITUDE_DEGREES.to_string(),
            latitude_minutes_column: stream::LATITUDE_MINUTES.to_string(),
            longitude_degrees_column: stream::LONGITUDE_DEGREES.to_string(),
            longitude_minutes_column: stream::LONGITUDE_MINUTES.to_string(),
            dropped_columns: stream::DROPPED_COLUMNS
                .iter()
                .map(|name| name.to_string())
                .collect(),
            missing_values: stream::MISSING_VALUES
                .iter()
                .map(|value| value.to_string())
                .collect(),
            corrected_latitude_column: output::CORRECTED_LATITUDE.to_string(),
            corrected_longitude_column: output::CORRECTED_LONGITUDE.to_string(),
        }
    }
}

/// Measurement event settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventConfig {
    /// Catalog column holding the filename fragment
    pub file_column: String,

    /// Trailing characters of the event name searched for the fragment
    pub suffix_window: usize,

    /// Profile file extension (case-insensitive)
    pub extension: String,

    /// Suffix appended to the catalog stem for the output catalog
    pub output_suffix: String,
}

impl Default for EventConfig {
    fn default() -> Self {
        Self {
            file_column: events::FILE_COLUMN.to_string(),
            suffix_window: events::SUFFIX_WINDOW,
            extension: events::PROFILE_EXTENSION.to_string(),
            output_suffix: events::OUTPUT_SUFFIX.to_string(),
        }
    }
}

/// Global configuration for one correction run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CorrectionConfig {
    /// GPS to UTC offset applied to instrument clocks
    pub leap_seconds: LeapSeconds,

    pub fixed_column: FixedColumnLayout,
    pub whitespace_report: WhitespaceReportLayout,
    pub stream: StreamConfig,
    pub events: EventConfig,
}

/// Whole-second offset between the instrument GPS clock and UTC
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LeapSeconds(pub i64);

impl Default for LeapSeconds {
    fn default() -> Self {
        Self(DEFAULT_LEAP_SECONDS)
    }
}

impl CorrectionConfig {
    /// Check the configuration for values that would silently corrupt a run
    pub fn validate(&self) -> Result<()> {
        if self.leap_seconds.0.abs() > MAX_LEAP_SECONDS {
            return Err(CorrectionError::configuration(format!(
                "Leap second offset {}s is outside the accepted range of +/-{}s",
                self.leap_seconds.0, MAX_LEAP_SECONDS
            )));
        }

        if self.events.suffix_window == 0 {
            return Err(CorrectionError::configuration(
                "Event suffix window must be at least one character",
            ));
        }

        let layout = &self.fixed_column;
        let mut positions = vec![
            layout.date_column,
            layout.time_column,
            layout.latitude_column,
            layout.longitude_column,
        ];
        positions.sort_unstable();
        positions.dedup();
        if positions.len() != 4 {
            return Err(CorrectionError::configuration(format!(
                "Fixed-column layout positions must be distinct (date={}, time={}, lat={}, lon={})",
                layout.date_column, layout.time_column, layout.latitude_column, layout.longitude_column
            )));
        }

        let stream = &self.stream;
        let names = [
            ("timestamp", &stream.timestamp_column),
            ("UTC time", &stream.utc_time_column),
            ("latitude degrees", &stream.latitude_degrees_column),
            ("latitude minutes", &stream.latitude_minutes_column),
            ("longitude degrees", &stream.longitude_degrees_column),
            ("longitude minutes", &stream.longitude_minutes_column),
            ("corrected latitude", &stream.corrected_latitude_column),
            ("corrected longitude", &stream.corrected_longitude_column),
            ("catalog file", &self.events.file_column),
        ];
        if let Some((role, _)) = names.iter().find(|(_, name)| name.trim().is_empty()) {
            return Err(CorrectionError::configuration(format!(
                "The {} column name must not be empty",
                role
            )));
        }

        debug!(
            "Configuration validated: leap_seconds={}, fixed skip={}, report skip={}",
            self.leap_seconds.0, self.fixed_column.skip_lines, self.whitespace_report.skip_lines
        );

        Ok(())
    }

    /// Override the leap-second offset
    pub fn with_leap_seconds(mut self, seconds: i64) -> Self {
        self.leap_seconds = LeapSeconds(seconds);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = CorrectionConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.leap_seconds, LeapSeconds(18));
        assert_eq!(config.fixed_column.min_fields(), 7);
        assert_eq!(config.stream.dropped_columns.len(), 19);
    }

    #[test]
    fn test_rejects_excessive_leap_offset() {
        let config = CorrectionConfig::default().with_leap_seconds(3600);
        let err = config.validate().unwrap_err();
        assert!(matches!(err, CorrectionError::Configuration { .. }));
    }

    #[test]
    fn test_rejects_overlapping_fixed_columns() {
        let mut config = CorrectionConfig::default();
        config.fixed_column.longitude_column = config.fixed_column.latitude_column;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_zero_suffix_window() {
        let mut config = CorrectionConfig::default();
        config.events.suffix_window = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_blank_column_name() {
        let mut config = CorrectionConfig::default();
        config.stream.utc_time_column = "  ".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("UTC time"));
    }
}
