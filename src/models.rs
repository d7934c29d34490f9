//! Core data structures for GNSS position matching.
//!
//! Defines the reference track built from the GNSS receiver log, the
//! field-logger and measurement-event records being corrected, and the
//! outcome and statistics objects reported back to the caller.

use crate::error::{CorrectionError, Result};
use crate::table::Table;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// Latitude/longitude pair in signed decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub latitude: f64,
    pub longitude: f64,
}

impl Position {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// One high-precision fix from the GNSS receiver log
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReferenceFix {
    pub instant: NaiveDateTime,
    pub latitude: f64,
    pub longitude: f64,
}

impl ReferenceFix {
    pub fn new(instant: NaiveDateTime, latitude: f64, longitude: f64) -> Self {
        Self {
            instant,
            latitude,
            longitude,
        }
    }

    pub fn position(&self) -> Position {
        Position::new(self.latitude, self.longitude)
    }
}

/// Reference fixes ordered by instant
///
/// Never empty. Fixes are sorted on construction so that binary search
/// over the instants is always valid regardless of input order.
#[derive(Debug, Clone, Serialize)]
pub struct ReferenceTrack {
    fixes: Vec<ReferenceFix>,
}

impl ReferenceTrack {
    /// Build a track, sorting fixes ascending by instant
    pub fn new(mut fixes: Vec<ReferenceFix>) -> Result<Self> {
        if fixes.is_empty() {
            return Err(CorrectionError::configuration(
                "Reference track contains no fixes",
            ));
        }

        let sorted = fixes.windows(2).all(|pair| pair[0].instant <= pair[1].instant);
        if !sorted {
            debug!("Reference fixes were out of order, sorting {} fixes", fixes.len());
            fixes.sort_by_key(|fix| fix.instant);
        }

        Ok(Self { fixes })
    }

    /// First instant covered by the track
    pub fn begin(&self) -> NaiveDateTime {
        self.fixes[0].instant
    }

    /// Last instant covered by the track
    pub fn end(&self) -> NaiveDateTime {
        self.fixes[self.fixes.len() - 1].instant
    }

    /// True when `instant` lies strictly between the first and last fix
    pub fn strictly_contains(&self, instant: NaiveDateTime) -> bool {
        self.begin() < instant && instant < self.end()
    }

    pub fn fixes(&self) -> &[ReferenceFix] {
        &self.fixes
    }

    pub fn len(&self) -> usize {
        self.fixes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fixes.is_empty()
    }
}

/// One row of the continuous field-logger table
#[derive(Debug, Clone)]
pub struct StreamRecord {
    /// Row index within the source table
    pub row: usize,
    pub timestamp: String,
    pub utc_time: String,
    pub latitude_degrees: String,
    pub latitude_minutes: String,
    pub longitude_degrees: String,
    pub longitude_minutes: String,
}

/// A field-logger row after timestamp normalisation and fix substitution
#[derive(Debug, Clone, PartialEq)]
pub struct CorrectedRecord {
    pub row: usize,
    pub instant: NaiveDateTime,
    pub corrected: Position,
}

/// Expected measurement named by a catalog row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    /// Row index within the catalog table
    pub row: usize,
    /// Filename fragment expected near the end of the profile file name
    pub fragment: String,
}

/// One discrete measurement tied to a profile file
#[derive(Debug, Clone, PartialEq)]
pub struct MeasurementEvent {
    /// Source file name
    pub name: String,
    /// Event time, already leap corrected; absent when the file could not be decoded
    pub instant: Option<NaiveDateTime>,
    pub self_reported: Option<Position>,
    pub corrected: Option<Position>,
}

impl MeasurementEvent {
    pub fn new(
        name: impl Into<String>,
        instant: Option<NaiveDateTime>,
        self_reported: Option<Position>,
    ) -> Self {
        Self {
            name: name.into(),
            instant,
            self_reported,
            corrected: None,
        }
    }
}

/// Data-integrity conditions that are reported but do not abort a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntegrityWarning {
    /// No profile matched the catalog fragment
    MissingEvent { row: usize, fragment: String },
    /// More than one profile matched the catalog fragment
    DuplicateMatch {
        row: usize,
        fragment: String,
        names: Vec<String>,
    },
    /// Mapped events differ in number from catalog rows
    CountMismatch { expected: usize, mapped: usize },
    /// Mapped events left without a corrected position
    UnmatchedPositions { names: Vec<String> },
}

impl fmt::Display for IntegrityWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IntegrityWarning::MissingEvent { row, fragment } => write!(
                f,
                "catalog row {} ('{}') has no matching profile file",
                row + 1,
                fragment
            ),
            IntegrityWarning::DuplicateMatch {
                row,
                fragment,
                names,
            } => write!(
                f,
                "catalog row {} ('{}') matches several profile files: {}",
                row + 1,
                fragment,
                names.join(", ")
            ),
            IntegrityWarning::CountMismatch { expected, mapped } => write!(
                f,
                "{} of {} catalog rows were mapped to a profile file; some files may be missing from the directory",
                mapped, expected
            ),
            IntegrityWarning::UnmatchedPositions { names } => write!(
                f,
                "no reference position could be matched for: {}",
                names.join(", ")
            ),
        }
    }
}

/// Counters for one stream correction run
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct StreamStats {
    pub rows_read: usize,
    pub rows_retained: usize,
    pub rows_outside_track: usize,
}

/// Result of a stream correction run
#[derive(Debug)]
pub struct StreamOutcome {
    pub table: Table,
    pub records: Vec<CorrectedRecord>,
    pub stats: StreamStats,
}

/// Result of an event correction run
#[derive(Debug)]
pub struct EventOutcome {
    pub table: Table,
    /// Catalog rows mapped to exactly one event, in catalog order
    pub mapped: Vec<Option<MeasurementEvent>>,
    pub warnings: Vec<IntegrityWarning>,
}

impl EventOutcome {
    pub fn mapped_count(&self) -> usize {
        self.mapped.iter().filter(|event| event.is_some()).count()
    }
}
