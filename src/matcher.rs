//! Insertion-point lookup of reference fixes.
//!
//! A query resolves to the first fix whose instant is not earlier than the
//! query, found by binary search. A query between two fixes always takes
//! the later one, whichever is closer.

// TODO: confirm with the survey data owners whether nearest-of-two
// selection should replace the insertion-point rule; outputs change if so.

use crate::error::{CorrectionError, Result};
use crate::models::{ReferenceFix, ReferenceTrack};
use chrono::NaiveDateTime;

/// Index of the first fix whose instant is `>= query`
///
/// Equals `track.len()` when the query is later than every fix.
pub fn insertion_index(track: &ReferenceTrack, query: NaiveDateTime) -> usize {
    track.fixes().partition_point(|fix| fix.instant < query)
}

/// Fix at the insertion point of `query`
///
/// Fails with [`CorrectionError::OutOfRange`] when the query is later
/// than the last fix.
pub fn match_fix(track: &ReferenceTrack, query: NaiveDateTime) -> Result<ReferenceFix> {
    track
        .fixes()
        .get(insertion_index(track, query))
        .copied()
        .ok_or(CorrectionError::OutOfRange {
            instant: query,
            begin: track.begin(),
            end: track.end(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2023, 12, 15)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    fn two_fix_track() -> ReferenceTrack {
        ReferenceTrack::new(vec![
            ReferenceFix::new(at(10, 0, 0), 45.0, -75.0),
            ReferenceFix::new(at(10, 0, 10), 45.001, -75.001),
        ])
        .unwrap()
    }

    #[test]
    fn test_between_fixes_takes_later() {
        let fix = match_fix(&two_fix_track(), at(10, 0, 5)).unwrap();
        assert_eq!(fix.latitude, 45.001);
        assert_eq!(fix.longitude, -75.001);
    }

    #[test]
    fn test_later_fix_even_when_earlier_is_closer() {
        let fix = match_fix(&two_fix_track(), at(10, 0, 1)).unwrap();
        assert_eq!(fix.instant, at(10, 0, 10));
    }

    #[test]
    fn test_exact_instant_returns_that_fix() {
        let track = two_fix_track();
        for fix in track.fixes() {
            assert_eq!(match_fix(&track, fix.instant).unwrap(), *fix);
        }
    }

    #[test]
    fn test_before_track_returns_first() {
        let fix = match_fix(&two_fix_track(), at(9, 0, 0)).unwrap();
        assert_eq!(fix.instant, at(10, 0, 0));
    }

    #[test]
    fn test_after_track_is_out_of_range() {
        let track = two_fix_track();
        assert_eq!(insertion_index(&track, at(10, 0, 11)), 2);

        let err = match_fix(&track, at(10, 0, 11)).unwrap_err();
        match err {
            CorrectionError::OutOfRange { instant, begin, end } => {
                assert_eq!(instant, at(10, 0, 11));
                assert_eq!(begin, at(10, 0, 0));
                assert_eq!(end, at(10, 0, 10));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_dense_track_between_every_pair() {
        let fixes: Vec<ReferenceFix> = (0..60)
            .map(|i| ReferenceFix::new(at(12, 0, 0) + chrono::TimeDelta::seconds(i * 2), i as f64, 0.0))
            .collect();
        let track = ReferenceTrack::new(fixes).unwrap();

        for i in 0..59 {
            let query = at(12, 0, 0) + chrono::TimeDelta::seconds(i * 2 + 1);
            assert_eq!(match_fix(&track, query).unwrap().latitude, (i + 1) as f64);
        }
    }
}
