//! Reference track loading from post-processed GNSS receiver output.
//!
//! Two layouts are supported:
//! - fixed-column kinematic solution logs (`.pos`), where date, time,
//!   latitude and longitude sit at fixed positions after splitting on
//!   single spaces and coordinates are already decimal degrees;
//! - whitespace-delimited precise point positioning reports with named
//!   columns and coordinates split into degrees, minutes and seconds.

use crate::config::{CorrectionConfig, FixedColumnLayout, WhitespaceReportLayout};
use crate::constants::{fixed_column, modes, whitespace_report};
use crate::coordinates::{dms_to_decimal, parse_coordinate_field};
use crate::error::{CorrectionError, Result};
use crate::models::{ReferenceFix, ReferenceTrack};
use crate::time::TimeNormalizer;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, info};

/// Layout of the correction source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CorrectionMode {
    /// Post-processed kinematic solution log
    FixedColumn,
    /// Precise point positioning report
    WhitespaceReport,
}

impl FromStr for CorrectionMode {
    type Err = CorrectionError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            modes::PPK | modes::FIXED_COLUMN => Ok(CorrectionMode::FixedColumn),
            modes::PPP | modes::WHITESPACE_REPORT => Ok(CorrectionMode::WhitespaceReport),
            other => Err(CorrectionError::configuration(format!(
                "Unknown correction file type '{}' (expected '{}' or '{}')",
                other,
                modes::PPK,
                modes::PPP
            ))),
        }
    }
}

impl fmt::Display for CorrectionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CorrectionMode::FixedColumn => write!(f, "{}", modes::PPK),
            CorrectionMode::WhitespaceReport => write!(f, "{}", modes::PPP),
        }
    }
}

/// Builds [`ReferenceTrack`]s from correction source files
#[derive(Debug, Clone)]
pub struct ReferenceTrackLoader {
    fixed_column: FixedColumnLayout,
    whitespace_report: WhitespaceReportLayout,
}

impl ReferenceTrackLoader {
    pub fn new(config: &CorrectionConfig) -> Self {
        Self {
            fixed_column: config.fixed_column.clone(),
            whitespace_report: config.whitespace_report.clone(),
        }
    }

    /// Load and sort the reference track from `path`
    pub fn load(&self, path: &Path, mode: CorrectionMode) -> Result<ReferenceTrack> {
        let content = std::fs::read_to_string(path).map_err(|e| CorrectionError::InvalidRow {
            path: path.to_path_buf(),
            line: 0,
            reason: format!("cannot read correction file: {}", e),
        })?;

        let track = self.parse(&content, mode, path)?;
        info!(
            "Loaded {} reference fixes ({}) from {} spanning {} to {}",
            track.len(),
            mode,
            path.display(),
            track.begin(),
            track.end()
        );
        Ok(track)
    }

    /// Parse correction file content; `source` is used in diagnostics only
    pub fn parse(&self, content: &str, mode: CorrectionMode, source: &Path) -> Result<ReferenceTrack> {
        let fixes = match mode {
            CorrectionMode::FixedColumn => self.parse_fixed_column(content, source)?,
            CorrectionMode::WhitespaceReport => self.parse_whitespace_report(content, source)?,
        };

        ReferenceTrack::new(fixes).map_err(|_| {
            CorrectionError::configuration(format!(
                "Correction file {} contains no position fixes",
                source.display()
            ))
        })
    }

    fn parse_fixed_column(&self, content: &str, source: &Path) -> Result<Vec<ReferenceFix>> {
        let layout = &self.fixed_column;
        let required = layout.min_fields();

        let mut fixes = Vec::new();
        // Column titles are ignored, positions are fixed
        for (line_number, line) in data_lines(content, layout.skip_lines).skip(1) {
            let fields: Vec<&str> = line.split(fixed_column::DELIMITER).collect();
            if fields.len() < required {
                return Err(CorrectionError::InvalidRow {
                    path: source.to_path_buf(),
                    line: line_number,
                    reason: format!("expected at least {} space-separated fields, found {}", required, fields.len()),
                });
            }

            let fix = parse_fix(
                fields[layout.date_column],
                fields[layout.time_column],
                || parse_coordinate_field("latitude", fields[layout.latitude_column]),
                || parse_coordinate_field("longitude", fields[layout.longitude_column]),
            )
            .map_err(|e| e.in_row(source, line_number))?;
            fixes.push(fix);
        }

        debug!("Parsed {} fixed-column rows from {}", fixes.len(), source.display());
        Ok(fixes)
    }

    fn parse_whitespace_report(&self, content: &str, source: &Path) -> Result<Vec<ReferenceFix>> {
        let mut lines = data_lines(content, self.whitespace_report.skip_lines);

        // Headers come from the first line after the preamble
        let (_, header_line) = lines.next().ok_or_else(|| {
            CorrectionError::configuration(format!(
                "Correction file {} has no column header after {} preamble lines",
                source.display(),
                self.whitespace_report.skip_lines
            ))
        })?;
        let headers: Vec<&str> = header_line.split_whitespace().collect();
        let column = |name: &str| {
            headers
                .iter()
                .position(|header| *header == name)
                .ok_or_else(|| CorrectionError::MissingColumn {
                    path: source.to_path_buf(),
                    column: name.to_string(),
                })
        };

        let date = column(whitespace_report::DATE_COLUMN)?;
        let time = column(whitespace_report::TIME_COLUMN)?;
        let latitude = [
            column(whitespace_report::LATITUDE_DEGREES)?,
            column(whitespace_report::LATITUDE_MINUTES)?,
            column(whitespace_report::LATITUDE_SECONDS)?,
        ];
        let longitude = [
            column(whitespace_report::LONGITUDE_DEGREES)?,
            column(whitespace_report::LONGITUDE_MINUTES)?,
            column(whitespace_report::LONGITUDE_SECONDS)?,
        ];

        let mut fixes = Vec::new();
        for (line_number, line) in lines {
            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.len() < headers.len() {
                return Err(CorrectionError::InvalidRow {
                    path: source.to_path_buf(),
                    line: line_number,
                    reason: format!("expected {} columns, found {}", headers.len(), fields.len()),
                });
            }

            let dms = |indices: [usize; 3], axis: &str| -> Result<f64> {
                let degrees = parse_coordinate_field(&format!("{} degrees", axis), fields[indices[0]])?;
                let minutes = parse_coordinate_field(&format!("{} minutes", axis), fields[indices[1]])?;
                let seconds = parse_coordinate_field(&format!("{} seconds", axis), fields[indices[2]])?;
                Ok(dms_to_decimal(degrees, minutes, seconds))
            };

            let fix = parse_fix(
                fields[date],
                fields[time],
                || dms(latitude, "latitude"),
                || dms(longitude, "longitude"),
            )
            .map_err(|e| e.in_row(source, line_number))?;
            fixes.push(fix);
        }

        debug!("Parsed {} report rows from {}", fixes.len(), source.display());
        Ok(fixes)
    }
}

fn parse_fix(
    date: &str,
    time: &str,
    latitude: impl FnOnce() -> Result<f64>,
    longitude: impl FnOnce() -> Result<f64>,
) -> Result<ReferenceFix> {
    let instant = TimeNormalizer::parse_split(date, time)?;
    Ok(ReferenceFix::new(instant, latitude()?, longitude()?))
}

/// Non-blank lines after the preamble, with 1-based line numbers
fn data_lines(content: &str, skip_lines: usize) -> impl Iterator<Item = (usize, &str)> {
    content
        .lines()
        .enumerate()
        .skip(skip_lines)
        .map(|(index, line)| (index + 1, line.trim_end_matches('\r')))
        .filter(|(_, line)| !line.trim().is_empty())
}
