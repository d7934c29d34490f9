//! Coordinate substitution for continuous field-logger streams.
//!
//! Each logger row carries a calendar timestamp, a compressed GPS time of
//! day and its own degree/minute position. Rows are placed on the UTC
//! timeline, trimmed to the span of the reference track, matched to a
//! reference fix and emitted with the reference coordinates in place of
//! the instrument-internal columns.

use crate::config::StreamConfig;
use crate::coordinates::{degree_minutes_to_decimal, parse_coordinate_field};
use crate::error::{CorrectionError, Result};
use crate::matcher::match_fix;
use crate::models::{CorrectedRecord, ReferenceTrack, StreamOutcome, StreamRecord, StreamStats};
use crate::table::Table;
use crate::time::TimeNormalizer;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Resolved positions of the required logger columns
#[derive(Debug, Clone, Copy)]
struct StreamColumns {
    timestamp: usize,
    utc_time: usize,
    latitude_degrees: usize,
    latitude_minutes: usize,
    longitude_degrees: usize,
    longitude_minutes: usize,
}

/// Drives matching for one field-logger table against one reference track
#[derive(Debug)]
pub struct StreamCorrector<'a> {
    track: &'a ReferenceTrack,
    config: &'a StreamConfig,
    normalizer: TimeNormalizer,
    source: PathBuf,
}

impl<'a> StreamCorrector<'a> {
    pub fn new(track: &'a ReferenceTrack, config: &'a StreamConfig, normalizer: TimeNormalizer) -> Self {
        Self {
            track,
            config,
            normalizer,
            source: PathBuf::from("<stream>"),
        }
    }

    /// Name the input in diagnostics
    pub fn with_source(mut self, source: impl Into<PathBuf>) -> Self {
        self.source = source.into();
        self
    }

    /// Read the logger file, dropping incomplete rows, ready for [`Self::correct`]
    pub fn read_stream(path: &Path, config: &StreamConfig) -> Result<Table> {
        let mut table = Table::read_csv(path, config.skip_lines)?;
        let dropped = table.drop_incomplete_rows(&config.missing_values);
        if dropped > 0 {
            debug!("Dropped {} incomplete rows from {}", dropped, path.display());
        }
        Ok(table)
    }

    /// Correct every logger row inside the reference track span
    ///
    /// Any malformed timestamp or coordinate aborts the whole run. A table
    /// with no rows strictly inside the track span is reported as
    /// [`CorrectionError::NoOverlap`].
    pub fn correct(&self, table: &Table) -> Result<StreamOutcome> {
        let columns = self.resolve_columns(table)?;
        let mut stats = StreamStats {
            rows_read: table.len(),
            ..Default::default()
        };

        let mut corrected = Vec::new();
        for row in 0..table.len() {
            let record = Self::record_at(table, row, columns);
            let line = table.line_of(row);

            let instant = self
                .normalizer
                .parse_compressed_with_leap_offset(&record.timestamp, &record.utc_time)
                .map_err(|e| e.in_row(&self.source, line))?;

            if !self.track.strictly_contains(instant) {
                stats.rows_outside_track += 1;
                continue;
            }

            let self_reported = self
                .self_reported_position(&record)
                .map_err(|e| e.in_row(&self.source, line))?;
            let fix = match_fix(self.track, instant).map_err(|e| e.in_row(&self.source, line))?;

            debug!(
                "Row {} at {}: logger ({:.7}, {:.7}) -> reference ({:.9}, {:.9})",
                row, instant, self_reported.0, self_reported.1, fix.latitude, fix.longitude
            );

            corrected.push(CorrectedRecord {
                row,
                instant,
                corrected: fix.position(),
            });
        }

        stats.rows_retained = corrected.len();
        if corrected.is_empty() {
            return Err(CorrectionError::NoOverlap {
                records: stats.rows_read,
                begin: self.track.begin(),
                end: self.track.end(),
            });
        }

        let output = self.build_output(table, &corrected);
        info!(
            "Corrected {} of {} logger rows ({} outside reference span)",
            stats.rows_retained, stats.rows_read, stats.rows_outside_track
        );

        Ok(StreamOutcome {
            table: output,
            records: corrected,
            stats,
        })
    }

    fn resolve_columns(&self, table: &Table) -> Result<StreamColumns> {
        let source = self.source.as_path();
        Ok(StreamColumns {
            timestamp: table.require_column(&self.config.timestamp_column, source)?,
            utc_time: table.require_column(&self.config.utc_time_column, source)?,
            latitude_degrees: table.require_column(&self.config.latitude_degrees_column, source)?,
            latitude_minutes: table.require_column(&self.config.latitude_minutes_column, source)?,
            longitude_degrees: table.require_column(&self.config.longitude_degrees_column, source)?,
            longitude_minutes: table.require_column(&self.config.longitude_minutes_column, source)?,
        })
    }

    fn record_at(table: &Table, row: usize, columns: StreamColumns) -> StreamRecord {
        let field = |column: usize| table.value(row, column).to_string();
        StreamRecord {
            row,
            timestamp: field(columns.timestamp),
            utc_time: field(columns.utc_time),
            latitude_degrees: field(columns.latitude_degrees),
            latitude_minutes: field(columns.latitude_minutes),
            longitude_degrees: field(columns.longitude_degrees),
            longitude_minutes: field(columns.longitude_minutes),
        }
    }

    /// Logger position in decimal degrees; validated but never emitted
    fn self_reported_position(&self, record: &StreamRecord) -> Result<(f64, f64)> {
        let config = self.config;
        let latitude = degree_minutes_to_decimal(
            parse_coordinate_field(&config.latitude_degrees_column, &record.latitude_degrees)?,
            parse_coordinate_field(&config.latitude_minutes_column, &record.latitude_minutes)?,
        );
        let longitude = degree_minutes_to_decimal(
            parse_coordinate_field(&config.longitude_degrees_column, &record.longitude_degrees)?,
            parse_coordinate_field(&config.longitude_minutes_column, &record.longitude_minutes)?,
        );
        Ok((latitude, longitude))
    }

    fn build_output(&self, table: &Table, corrected: &[CorrectedRecord]) -> Table {
        let kept: Vec<usize> = table
            .headers()
            .iter()
            .enumerate()
            .filter(|(_, name)| !self.config.dropped_columns.contains(name))
            .map(|(index, _)| index)
            .collect();

        for name in &self.config.dropped_columns {
            if table.column_index(name).is_none() {
                debug!("Column '{}' not present in {}, nothing to drop", name, self.source.display());
            }
        }

        let mut headers: Vec<String> = kept.iter().map(|&index| table.headers()[index].clone()).collect();
        headers.push(self.config.corrected_latitude_column.clone());
        headers.push(self.config.corrected_longitude_column.clone());

        let mut output = Table::new(headers);
        for record in corrected {
            let mut fields: Vec<String> = kept
                .iter()
                .map(|&index| table.value(record.row, index).to_string())
                .collect();
            fields.push(record.corrected.latitude.to_string());
            fields.push(record.corrected.longitude.to_string());
            output.push_row(fields);
        }
        output
    }
}
