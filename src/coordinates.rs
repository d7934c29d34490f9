//! Angular coordinate conversion to signed decimal degrees.

use crate::error::{CorrectionError, Result};

/// Convert a degrees/minutes/seconds triple to decimal degrees
///
/// The sign is taken from `degrees` alone; minutes and seconds are
/// treated as magnitudes.
///
/// ```
/// use gnss_matcher::coordinates::dms_to_decimal;
///
/// assert!((dms_to_decimal(45.0, 30.0, 15.0) - 45.504166666).abs() < 1e-6);
/// assert!((dms_to_decimal(-45.0, 30.0, 15.0) + 45.504166666).abs() < 1e-6);
/// ```
pub fn dms_to_decimal(degrees: f64, minutes: f64, seconds: f64) -> f64 {
    let magnitude = degrees.abs() + minutes / 60.0 + seconds / 3600.0;
    if degrees >= 0.0 { magnitude } else { -magnitude }
}

/// Convert split degree and decimal-minute fields to decimal degrees
///
/// Computed as `degrees + minutes / 60` with no sign handling: a negative
/// degree part must come with a negative minute part or the result is
/// wrong.
pub fn degree_minutes_to_decimal(degrees: f64, minutes: f64) -> f64 {
    degrees + minutes / 60.0
}

/// Parse a numeric coordinate field
pub fn parse_coordinate_field(field: &str, value: &str) -> Result<f64> {
    let parsed = value.trim().parse::<f64>().map_err(|e| {
        CorrectionError::parse(field, value, format!("not a number ({})", e))
    })?;

    if !parsed.is_finite() {
        return Err(CorrectionError::parse(field, value, "not a finite number"));
    }

    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE: f64 = 1e-9;

    #[test]
    fn test_dms_positive() {
        assert!((dms_to_decimal(45.0, 30.0, 15.0) - 45.50416666666667).abs() < TOLERANCE);
    }

    #[test]
    fn test_dms_negative_degrees_negate_whole_value() {
        assert!((dms_to_decimal(-45.0, 30.0, 15.0) + 45.50416666666667).abs() < TOLERANCE);
        assert!((dms_to_decimal(-75.0, 41.0, 54.36) + 75.69843333333333).abs() < TOLERANCE);
    }

    #[test]
    fn test_dms_zero_degrees_is_positive() {
        assert!((dms_to_decimal(0.0, 30.0, 0.0) - 0.5).abs() < TOLERANCE);
    }

    #[test]
    fn test_degree_minutes_keeps_raw_sign() {
        assert!((degree_minutes_to_decimal(45.0, 30.0) - 45.5).abs() < TOLERANCE);
        assert!((degree_minutes_to_decimal(-75.0, -30.0) + 75.5).abs() < TOLERANCE);
        // mismatched signs are not corrected
        assert!((degree_minutes_to_decimal(-75.0, 30.0) + 74.5).abs() < TOLERANCE);
    }

    #[test]
    fn test_parse_coordinate_field() {
        assert_eq!(parse_coordinate_field("latitude_a", " 45 ").unwrap(), 45.0);

        let err = parse_coordinate_field("latitude_a", "N45").unwrap_err();
        assert!(matches!(err, CorrectionError::Parse { .. }));
        assert!(err.to_string().contains("latitude_a"));

        assert!(parse_coordinate_field("latitude_b", "NaN").is_err());
    }
}
