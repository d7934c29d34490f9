//! Application constants for the GNSS position matcher
//!
//! This module contains the default values, column names and file
//! layout conventions of the field instruments and GNSS receivers
//! supported by the matcher.

// =============================================================================
// Time Base
// =============================================================================

/// GPS time is ahead of UTC by this many whole seconds.
///
/// Correct as of 2024. Must be revisited whenever IERS announces a new
/// leap second.
pub const DEFAULT_LEAP_SECONDS: i64 = 18;

/// Largest leap offset accepted from configuration
pub const MAX_LEAP_SECONDS: i64 = 60;

// =============================================================================
// Reference Track Layouts
// =============================================================================

/// Literal mode names accepted on the command line
pub mod modes {
    pub const PPK: &str = "PPK_correction";
    pub const PPP: &str = "PPP_correction";
    pub const FIXED_COLUMN: &str = "fixed-column";
    pub const WHITESPACE_REPORT: &str = "whitespace-report";
}

/// Post-processed kinematic (.pos) solution log
pub mod fixed_column {
    /// Preamble lines before the column-title line
    pub const SKIP_LINES: usize = 9;
    pub const DATE_COLUMN: usize = 0;
    pub const TIME_COLUMN: usize = 1;
    pub const LATITUDE_COLUMN: usize = 4;
    pub const LONGITUDE_COLUMN: usize = 6;
    pub const DELIMITER: char = ' ';
}

/// Precise point positioning summary report
pub mod whitespace_report {
    /// Preamble lines before the column-title line
    pub const SKIP_LINES: usize = 3;
    pub const DATE_COLUMN: &str = "YEAR-MM-DD";
    pub const TIME_COLUMN: &str = "HR:MN:SS.SS";
    pub const LATITUDE_DEGREES: &str = "LATDD";
    pub const LATITUDE_MINUTES: &str = "LATMN";
    pub const LATITUDE_SECONDS: &str = "LATSS";
    pub const LONGITUDE_DEGREES: &str = "LONDD";
    pub const LONGITUDE_MINUTES: &str = "LONMN";
    pub const LONGITUDE_SECONDS: &str = "LONSS";
}

// =============================================================================
// Field Logger Stream
// =============================================================================

/// Column names of the data logger table
pub mod stream {
    /// Lines before the column-title line (logger file banner)
    pub const SKIP_LINES: usize = 1;
    pub const TIMESTAMP_COLUMN: &str = "TIMESTAMP";
    pub const UTC_TIME_COLUMN: &str = "ThisUTCtime";
    pub const LATITUDE_DEGREES: &str = "latitude_a";
    pub const LATITUDE_MINUTES: &str = "latitude_b";
    pub const LONGITUDE_DEGREES: &str = "Longitude_a";
    pub const LONGITUDE_MINUTES: &str = "Longitude_b";

    /// Instrument-internal columns removed from the corrected output
    pub const DROPPED_COLUMNS: &[&str] = &[
        "RECORD",
        "BattVolts",
        "latitude_a",
        "latitude_b",
        "Longitude_a",
        "Longitude_b",
        "fix_quality",
        "nmbr_satellites",
        "LatitudeDDDDD",
        "LongitudeDDDDD",
        "HDOP",
        "altitudeB",
        "DepthVolts",
        "month",
        "dayofmonth",
        "hourofday",
        "minutes",
        "seconds",
        "microseconds",
    ];

    /// Field values read as missing, in addition to an empty field
    ///
    /// Loggers write `NAN` when the receiver has no fix.
    pub const MISSING_VALUES: &[&str] = &[
        "NAN", "NaN", "nan", "-NaN", "-nan", "NA", "N/A", "n/a", "#N/A", "#NA", "<NA>", "NULL",
        "null", "None",
    ];
}

/// Column names appended to corrected output
pub mod output {
    pub const CORRECTED_LATITUDE: &str = "lat_emlid";
    pub const CORRECTED_LONGITUDE: &str = "lon_emlid";
    pub const EVENT_NAME: &str = "name";
    pub const EVENT_TIMESTAMP: &str = "timestamp";
    pub const EVENT_LATITUDE: &str = "lat";
    pub const EVENT_LONGITUDE: &str = "lon";
}

// =============================================================================
// Measurement Events
// =============================================================================

pub mod events {
    /// Catalog column holding the filename fragment
    pub const FILE_COLUMN: &str = "file";

    /// Trailing characters of a profile filename searched for the fragment
    pub const SUFFIX_WINDOW: usize = 8;

    /// Profile file extension, compared case-insensitively
    pub const PROFILE_EXTENSION: &str = "pnt";

    /// Appended to the catalog file stem for the corrected catalog
    pub const OUTPUT_SUFFIX: &str = "_improved";

    /// Manifest columns written by the external profile decoder
    pub const MANIFEST_NAME: &str = "name";
    pub const MANIFEST_TIMESTAMP: &str = "timestamp";
    pub const MANIFEST_LATITUDE: &str = "latitude";
    pub const MANIFEST_LONGITUDE: &str = "longitude";
}
