//! Visit duration calculation
//!
//! Durations only look at the time of day: entry and exit are both placed on
//! the same day before subtracting. A visit that crosses midnight therefore
//! produces a negative duration. This is a known limitation of the visit log,
//! which records a single `visit_date` per visit.

use chrono::NaiveTime;

/// Upper bounds (exclusive, in minutes) of the duration histogram buckets.
/// The last bucket is open-ended.
pub const DURATION_BUCKET_BOUNDS: [i64; 4] = [30, 60, 120, 240];

/// Labels of the duration histogram buckets, aligned with [`DURATION_BUCKET_BOUNDS`]
pub const DURATION_BUCKET_LABELS: [&str; 5] = ["<30 min", "30-60 min", "1-2 hrs", "2-4 hrs", ">4 hrs"];

/// Whole minutes elapsed between entry and exit, `None` when there is no exit yet
pub fn duration_minutes(entry: NaiveTime, exit: Option<NaiveTime>) -> Option<i64> {
    exit.map(|exit| exit.signed_duration_since(entry).num_minutes())
}

/// Histogram bucket index for a duration
pub fn duration_bucket(minutes: i64) -> usize {
    DURATION_BUCKET_BOUNDS
        .iter()
        .position(|&bound| minutes < bound)
        .unwrap_or(DURATION_BUCKET_BOUNDS.len())
}

/// Table rendering of a duration: `45m`, or `-` when indeterminate
pub fn format_duration(minutes: Option<i64>) -> String {
    match minutes {
        Some(m) => format!("{}m", m),
        None => "-".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn test_duration_minutes() {
        assert_eq!(duration_minutes(t(9, 0), Some(t(9, 20))), Some(20));
        assert_eq!(duration_minutes(t(10, 0), Some(t(11, 30))), Some(90));
        assert_eq!(duration_minutes(t(14, 0), None), None);
    }

    #[test]
    fn test_partial_minutes_are_truncated() {
        let entry = NaiveTime::from_hms_opt(9, 0, 0).unwrap();
        let exit = NaiveTime::from_hms_opt(9, 14, 59).unwrap();
        assert_eq!(duration_minutes(entry, Some(exit)), Some(14));
    }

    #[test]
    fn test_overnight_visit_is_negative() {
        assert_eq!(duration_minutes(t(23, 30), Some(t(0, 30))), Some(-1380));
    }

    #[test]
    fn test_duration_bucket_edges() {
        assert_eq!(duration_bucket(-5), 0);
        assert_eq!(duration_bucket(0), 0);
        assert_eq!(duration_bucket(29), 0);
        assert_eq!(duration_bucket(30), 1);
        assert_eq!(duration_bucket(59), 1);
        assert_eq!(duration_bucket(60), 2);
        assert_eq!(duration_bucket(119), 2);
        assert_eq!(duration_bucket(120), 3);
        assert_eq!(duration_bucket(239), 3);
        assert_eq!(duration_bucket(240), 4);
        assert_eq!(duration_bucket(1000), 4);
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Some(45)), "45m");
        assert_eq!(format_duration(None), "-");
    }
}
