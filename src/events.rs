//! Coordinate substitution for discrete measurement events.
//!
//! Every profile file in a survey directory is one measurement event with
//! its own timestamp. A catalog names the expected events by filename
//! fragment; each catalog row is mapped to one event, that event's instant
//! is matched against the reference track, and the catalog is re-emitted
//! with the matched fields appended. Problems with a single event never
//! abort the batch: they surface as [`IntegrityWarning`]s.

use crate::config::EventConfig;
use crate::coordinates::parse_coordinate_field;
use crate::constants::{events, output};
use crate::error::{CorrectionError, Result};
use crate::matcher::match_fix;
use crate::models::{CatalogEntry, EventOutcome, IntegrityWarning, MeasurementEvent, Position, ReferenceTrack};
use crate::table::Table;
use crate::time::TimeNormalizer;
use chrono::{DateTime, FixedOffset};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Timestamp and optional position decoded from one profile file
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileReading {
    pub timestamp: DateTime<FixedOffset>,
    pub coordinates: Option<Position>,
}

/// Reads the header of a proprietary profile file
pub trait ProfileDecoder {
    fn decode(&self, path: &Path) -> Result<ProfileReading>;
}

/// Row of a decoded-profile manifest
#[derive(Debug, Deserialize)]
struct ManifestRow {
    name: String,
    timestamp: String,
    latitude: Option<String>,
    longitude: Option<String>,
}

/// Manifest row that named a profile but could not be read
#[derive(Debug, Clone)]
struct RejectedRow {
    line: usize,
    reason: String,
}

/// Decoder backed by a CSV manifest exported by the profile toolkit
///
/// Columns: `name,timestamp,latitude,longitude` with RFC 3339 timestamps;
/// empty coordinates mean the profile carried no position. A row with a
/// bad timestamp or coordinate only fails decoding of that profile.
#[derive(Debug, Default)]
pub struct ManifestDecoder {
    source: PathBuf,
    readings: HashMap<String, std::result::Result<ProfileReading, RejectedRow>>,
}

impl ManifestDecoder {
    pub fn from_path(path: &Path) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(path)
            .map_err(|e| CorrectionError::InvalidRow {
                path: path.to_path_buf(),
                line: 0,
                reason: format!("cannot read profile manifest: {}", e),
            })?;

        let mut readings = HashMap::new();
        for (index, row) in reader.deserialize::<ManifestRow>().enumerate() {
            // header occupies line 1
            let line = index + 2;
            let row = row.map_err(|e| CorrectionError::InvalidRow {
                path: path.to_path_buf(),
                line,
                reason: e.to_string(),
            })?;

            let reading = Self::reading(&row).map_err(|e| {
                warn!("Profile '{}' rejected at line {} of {}: {}", row.name, line, path.display(), e);
                RejectedRow {
                    line,
                    reason: e.to_string(),
                }
            });

            if readings.insert(row.name.clone(), reading).is_some() {
                warn!("Profile '{}' listed more than once in {}, keeping the last entry", row.name, path.display());
            }
        }

        debug!("Loaded {} profile readings from {}", readings.len(), path.display());
        Ok(Self {
            source: path.to_path_buf(),
            readings,
        })
    }

    fn reading(row: &ManifestRow) -> Result<ProfileReading> {
        let timestamp = DateTime::parse_from_rfc3339(&row.timestamp).map_err(|e| {
            CorrectionError::parse(events::MANIFEST_TIMESTAMP, &row.timestamp, e.to_string())
        })?;

        let coordinate = |field: &str, value: &Option<String>| -> Result<Option<f64>> {
            match value.as_deref() {
                None | Some("") => Ok(None),
                Some(text) => parse_coordinate_field(field, text).map(Some),
            }
        };
        let latitude = coordinate(events::MANIFEST_LATITUDE, &row.latitude)?;
        let longitude = coordinate(events::MANIFEST_LONGITUDE, &row.longitude)?;
        let coordinates = match (latitude, longitude) {
            (Some(latitude), Some(longitude)) => Some(Position::new(latitude, longitude)),
            _ => None,
        };

        Ok(ProfileReading { timestamp, coordinates })
    }

    pub fn insert(&mut self, name: impl Into<String>, reading: ProfileReading) {
        self.readings.insert(name.into(), Ok(reading));
    }
}

impl ProfileDecoder for ManifestDecoder {
    fn decode(&self, path: &Path) -> Result<ProfileReading> {
        let name = file_name(path);
        match self.readings.get(&name) {
            Some(Ok(reading)) => Ok(reading.clone()),
            Some(Err(rejected)) => Err(CorrectionError::InvalidRow {
                path: self.source.clone(),
                line: rejected.line,
                reason: rejected.reason.clone(),
            }),
            None => Err(CorrectionError::parse(
                events::MANIFEST_NAME,
                name,
                "profile not present in the decoded manifest",
            )),
        }
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Enumerate profile files in `directory` (non-recursive) as events
///
/// Files the decoder cannot read become events without an instant.
pub fn collect_events(
    directory: &Path,
    config: &EventConfig,
    decoder: &dyn ProfileDecoder,
    normalizer: TimeNormalizer,
) -> Result<Vec<MeasurementEvent>> {
    let mut paths: Vec<PathBuf> = Vec::new();
    for entry in WalkDir::new(directory).min_depth(1).max_depth(1) {
        let entry = entry.map_err(|e| CorrectionError::InvalidRow {
            path: directory.to_path_buf(),
            line: 0,
            reason: format!("cannot list profile directory: {}", e),
        })?;
        let is_profile = entry.file_type().is_file()
            && entry
                .path()
                .extension()
                .is_some_and(|ext| ext.to_string_lossy().eq_ignore_ascii_case(&config.extension));
        if is_profile {
            paths.push(entry.into_path());
        }
    }
    paths.sort();

    let events: Vec<MeasurementEvent> = paths
        .iter()
        .map(|path| {
            let name = file_name(path);
            match decoder.decode(path) {
                Ok(reading) => {
                    let instant = normalizer.normalize_event_timestamp(reading.timestamp);
                    MeasurementEvent::new(name, instant, reading.coordinates)
                }
                Err(e) => {
                    warn!("Could not decode profile {}: {}", path.display(), e);
                    MeasurementEvent::new(name, None, None)
                }
            }
        })
        .collect();

    info!("Found {} profile files in {}", events.len(), directory.display());
    Ok(events)
}

/// Drives catalog-to-event mapping and per-event matching
#[derive(Debug)]
pub struct EventCorrector<'a> {
    track: &'a ReferenceTrack,
    config: &'a EventConfig,
    source: PathBuf,
}

impl<'a> EventCorrector<'a> {
    pub fn new(track: &'a ReferenceTrack, config: &'a EventConfig) -> Self {
        Self {
            track,
            config,
            source: PathBuf::from("<catalog>"),
        }
    }

    /// Name the catalog in diagnostics
    pub fn with_source(mut self, source: impl Into<PathBuf>) -> Self {
        self.source = source.into();
        self
    }

    /// Map catalog rows to events, match each event and build the output catalog
    pub fn correct(&self, catalog: &Table, events: &[MeasurementEvent]) -> Result<EventOutcome> {
        let entries = self.catalog_entries(catalog)?;
        let mut warnings = Vec::new();

        let mut mapped: Vec<Option<MeasurementEvent>> = Vec::with_capacity(entries.len());
        for CatalogEntry { row, fragment } in entries {
            let candidates: Vec<&MeasurementEvent> = events
                .iter()
                .filter(|event| self.fragment_matches(&fragment, &event.name))
                .collect();

            match candidates.as_slice() {
                [event] => {
                    let mut event = (*event).clone();
                    event.corrected = self.match_event(&event);
                    mapped.push(Some(event));
                }
                [] => {
                    warnings.push(IntegrityWarning::MissingEvent { row, fragment });
                    mapped.push(None);
                }
                several => {
                    warnings.push(IntegrityWarning::DuplicateMatch {
                        row,
                        fragment,
                        names: several.iter().map(|event| event.name.clone()).collect(),
                    });
                    mapped.push(None);
                }
            }
        }

        let mapped_count = mapped.iter().filter(|event| event.is_some()).count();
        if mapped_count != catalog.len() {
            warnings.push(IntegrityWarning::CountMismatch {
                expected: catalog.len(),
                mapped: mapped_count,
            });
        }

        let unmatched: Vec<String> = mapped
            .iter()
            .flatten()
            .filter(|event| event.corrected.is_none())
            .map(|event| event.name.clone())
            .collect();
        if !unmatched.is_empty() {
            warnings.push(IntegrityWarning::UnmatchedPositions { names: unmatched });
        }

        for warning in &warnings {
            warn!("{}", warning);
        }
        info!(
            "Mapped {} of {} catalog rows, {} integrity warnings",
            mapped_count,
            catalog.len(),
            warnings.len()
        );

        Ok(EventOutcome {
            table: build_output(catalog, &mapped),
            mapped,
            warnings,
        })
    }

    /// Catalog rows in order, with their filename fragments
    pub fn catalog_entries(&self, catalog: &Table) -> Result<Vec<CatalogEntry>> {
        let file_column = catalog.require_column(&self.config.file_column, &self.source)?;
        Ok((0..catalog.len())
            .map(|row| CatalogEntry {
                row,
                fragment: catalog.value(row, file_column).trim().to_string(),
            })
            .collect())
    }

    /// True when `fragment` occurs in the trailing window of `name`
    fn fragment_matches(&self, fragment: &str, name: &str) -> bool {
        if fragment.is_empty() {
            return false;
        }
        let skip = name.chars().count().saturating_sub(self.config.suffix_window);
        let tail: String = name.chars().skip(skip).collect();
        tail.contains(fragment)
    }

    /// Reference position for one event, or `None` when it cannot be placed
    fn match_event(&self, event: &MeasurementEvent) -> Option<Position> {
        let instant = event.instant?;
        match match_fix(self.track, instant) {
            Ok(fix) => Some(fix.position()),
            Err(e) => {
                debug!("Event {} not matched: {}", event.name, e);
                None
            }
        }
    }
}

/// Output file for a corrected catalog: `<stem><suffix>.<ext>` beside the input
pub fn improved_catalog_path(catalog: &Path, suffix: &str) -> PathBuf {
    let stem = catalog
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    let file_name = match catalog.extension() {
        Some(ext) => format!("{}{}.{}", stem, suffix, ext.to_string_lossy()),
        None => format!("{}{}", stem, suffix),
    };
    catalog.with_file_name(file_name)
}

fn build_output(catalog: &Table, mapped: &[Option<MeasurementEvent>]) -> Table {
    let mut headers = catalog.headers().to_vec();
    headers.extend(
        [
            output::EVENT_NAME,
            output::EVENT_TIMESTAMP,
            output::EVENT_LATITUDE,
            output::EVENT_LONGITUDE,
            output::CORRECTED_LATITUDE,
            output::CORRECTED_LONGITUDE,
        ]
        .map(String::from),
    );

    let optional = |value: Option<f64>| value.map(|v| v.to_string()).unwrap_or_default();

    let mut table = Table::new(headers);
    for (row, event) in mapped.iter().enumerate() {
        let mut fields: Vec<String> = (0..catalog.headers().len())
            .map(|column| catalog.value(row, column).to_string())
            .collect();
        match event {
            Some(event) => fields.extend([
                event.name.clone(),
                event
                    .instant
                    .map(|instant| instant.format("%Y-%m-%d %H:%M:%S").to_string())
                    .unwrap_or_default(),
                optional(event.self_reported.map(|p| p.latitude)),
                optional(event.self_reported.map(|p| p.longitude)),
                optional(event.corrected.map(|p| p.latitude)),
                optional(event.corrected.map(|p| p.longitude)),
            ]),
            None => fields.extend(std::iter::repeat_n(String::new(), 6)),
        }
        table.push_row(fields);
    }
    table
}
