//! Timestamp normalisation onto a single UTC timeline.
//!
//! The GNSS receiver writes split date and time columns, the field logger
//! writes a calendar timestamp next to a compressed `HHMMSS` GPS time of
//! day, and profile files carry zoned timestamps. Everything is reduced to
//! a timezone-naive [`NaiveDateTime`] understood as UTC.

use crate::config::LeapSeconds;
use crate::error::{CorrectionError, Result};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, Timelike};

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%Y.%m.%d", "%m/%d/%Y", "%d-%b-%Y", "%Y%m%d"];

const TIME_FORMATS: &[&str] = &["%H:%M:%S%.f", "%H:%M:%S", "%H:%M"];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S%.f",
    "%Y/%m/%d %H:%M:%S",
];

/// Converts instrument time representations to corrected UTC instants
#[derive(Debug, Clone, Copy, Default)]
pub struct TimeNormalizer {
    leap_seconds: LeapSeconds,
}

impl TimeNormalizer {
    pub fn new(leap_seconds: LeapSeconds) -> Self {
        Self { leap_seconds }
    }

    /// Combine independently formatted date and time strings
    ///
    /// Sub-second and timezone components are discarded.
    pub fn parse_split(date_text: &str, time_text: &str) -> Result<NaiveDateTime> {
        let date = parse_calendar_date(date_text)
            .ok_or_else(|| CorrectionError::parse("date", date_text, "not a recognised calendar date"))?;
        let time = parse_clock_time(time_text)
            .ok_or_else(|| CorrectionError::parse("time", time_text, "not a recognised clock time"))?;

        Ok(date.and_time(time))
    }

    /// Combine an ISO-8601 calendar date with a compressed `HHMMSS` time and
    /// shift by the leap-second offset
    pub fn parse_compressed_with_leap_offset(
        &self,
        iso_date_text: &str,
        hhmmss_text: &str,
    ) -> Result<NaiveDateTime> {
        let time = parse_hhmmss(hhmmss_text)?;
        let date = parse_iso_date(iso_date_text).ok_or_else(|| {
            CorrectionError::format("ISO-8601 timestamp", iso_date_text, "no valid calendar date")
        })?;

        self.apply_leap(date.and_time(time)).ok_or_else(|| {
            CorrectionError::format(
                "ISO-8601 timestamp",
                iso_date_text,
                "leap second correction overflows the calendar",
            )
        })
    }

    /// Strip the zone from a decoder timestamp (converting to UTC) and apply
    /// the leap-second offset
    pub fn normalize_event_timestamp(
        &self,
        timestamp: DateTime<FixedOffset>,
    ) -> Option<NaiveDateTime> {
        self.apply_leap(timestamp.naive_utc())
    }

    fn apply_leap(&self, instant: NaiveDateTime) -> Option<NaiveDateTime> {
        instant.checked_add_signed(TimeDelta::seconds(self.leap_seconds.0))
    }
}

/// Parse exactly six digits as hours, minutes and seconds
fn parse_hhmmss(text: &str) -> Result<NaiveTime> {
    if text.len() != 6 || !text.bytes().all(|b| b.is_ascii_digit()) {
        return Err(CorrectionError::format(
            "HHMMSS time",
            text,
            "expected exactly 6 digits",
        ));
    }

    let field = |range: std::ops::Range<usize>| text[range].parse::<u32>().unwrap_or(u32::MAX);
    let (hours, minutes, seconds) = (field(0..2), field(2..4), field(4..6));

    NaiveTime::from_hms_opt(hours, minutes, seconds).ok_or_else(|| {
        CorrectionError::format("HHMMSS time", text, "not a valid time of day")
    })
}

fn parse_iso_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();

    if let Ok(zoned) = DateTime::parse_from_rfc3339(text) {
        return Some(zoned.date_naive());
    }

    DATETIME_FORMATS
        .iter()
        .take(6)
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .map(|datetime| datetime.date())
        .or_else(|| NaiveDate::parse_from_str(text, "%Y-%m-%d").ok())
        .or_else(|| NaiveDate::parse_from_str(text, "%Y%m%d").ok())
}

fn parse_calendar_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();

    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(text, format).ok())
        .or_else(|| parse_full_datetime(text).map(|datetime| datetime.date()))
}

fn parse_clock_time(text: &str) -> Option<NaiveTime> {
    let text = text.trim();

    TIME_FORMATS
        .iter()
        .find_map(|format| NaiveTime::parse_from_str(text, format).ok())
        .or_else(|| parse_full_datetime(text).map(|datetime| datetime.time()))
        .and_then(|time| time.with_nanosecond(0))
}

fn parse_full_datetime(text: &str) -> Option<NaiveDateTime> {
    if let Ok(zoned) = DateTime::parse_from_rfc3339(text) {
        return Some(zoned.naive_local());
    }

    DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
}
