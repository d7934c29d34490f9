//! GNSS Position Matcher Library
//!
//! Replaces the positions logged by field instruments with the positions of
//! a post-processed (PPK or PPP) GNSS receiver at the matching instant.
//!
//! This library provides tools for:
//! - Normalising instrument and receiver timestamps onto one UTC timeline
//! - Converting degree/minute/second coordinates to decimal degrees
//! - Loading kinematic solution logs and precise point positioning reports
//! - Insertion-point matching of instants against the reference track
//! - Correcting continuous logger streams and catalogs of discrete profiles

pub mod cli;
pub mod config;
pub mod constants;
pub mod coordinates;
pub mod error;
pub mod events;
pub mod matcher;
pub mod models;
pub mod reference;
pub mod stream;
pub mod table;
pub mod time;

// Re-export commonly used types
pub use config::CorrectionConfig;
pub use error::{CorrectionError, Result};
pub use events::{EventCorrector, ManifestDecoder, ProfileDecoder, ProfileReading};
pub use models::{CatalogEntry, IntegrityWarning, MeasurementEvent, Position, ReferenceFix, ReferenceTrack};
pub use reference::{CorrectionMode, ReferenceTrackLoader};
pub use stream::StreamCorrector;
pub use table::Table;
pub use time::TimeNormalizer;
