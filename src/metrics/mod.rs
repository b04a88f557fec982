//! Occupancy metrics derived from a short series of distance samples.
//!
//! Every call recomputes the full snapshot from the series it is given; nothing
//! is carried between calls.

use serde::Serialize;
use time::OffsetDateTime;

pub mod format;

/// Distance (cm) above which the subject is considered away from the desk.
pub const DEFAULT_ABSENCE_THRESHOLD_CM: f64 = 120.0;

/// Inter-sample intervals at or above this many seconds are treated as the
/// device being offline and do not count towards either time bucket.
pub const DISCONTINUITY_GAP_SECS: f64 = 60.0;

/// One distance reading with its capture time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub timestamp: OffsetDateTime,
    pub distance_cm: f64,
}

impl Sample {
    pub fn new(timestamp: OffsetDateTime, distance_cm: f64) -> Self {
        Self {
            timestamp,
            distance_cm,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct MetricsSnapshot {
    pub seconds_absent: f64,
    pub seconds_present: f64,
    pub departure_count: u32,
    pub current_distance_cm: f64,
    pub currently_absent: bool,
}

/// Copy of `samples` ordered oldest first. Equal timestamps keep their input order.
pub fn chronological(samples: &[Sample]) -> Vec<Sample> {
    let mut ordered = samples.to_vec();
    ordered.sort_by_key(|sample| sample.timestamp);
    ordered
}

/// Derive the occupancy snapshot for `samples` against `threshold_cm`.
///
/// Input is not validated: negative distances are classified like any other
/// value and a NaN distance compares as "not above threshold", so it lands in
/// the present bucket and clears the departure edge detector.
pub fn compute_metrics(samples: &[Sample], threshold_cm: f64) -> MetricsSnapshot {
    let ordered = chronological(samples);

    let Some(last) = ordered.last() else {
        return MetricsSnapshot::default();
    };

    let mut seconds_absent = 0.0;
    let mut seconds_present = 0.0;
    let mut departure_count = 0u32;
    let mut was_absent = false;

    for pair in ordered.windows(2) {
        let (previous, current) = (&pair[0], &pair[1]);
        let gap = (current.timestamp - previous.timestamp).as_seconds_f64();
        let absent = current.distance_cm > threshold_cm;

        if gap < DISCONTINUITY_GAP_SECS {
            if absent {
                seconds_absent += gap;
            } else {
                seconds_present += gap;
            }
        }

        // No gap filter here: coming back online away from the desk counts
        // as a departure.
        if absent {
            if !was_absent {
                departure_count += 1;
                was_absent = true;
            }
        } else {
            was_absent = false;
        }
    }

    MetricsSnapshot {
        seconds_absent,
        seconds_present,
        departure_count,
        current_distance_cm: last.distance_cm,
        currently_absent: last.distance_cm > threshold_cm,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::Duration;
    use time::macros::datetime;

    const THRESHOLD: f64 = 120.0;

    fn series(spacing_secs: i64, distances: &[f64]) -> Vec<Sample> {
        let start = datetime!(2025-11-20 14:00:00 UTC);
        distances
            .iter()
            .enumerate()
            .map(|(index, distance)| {
                Sample::new(start + Duration::seconds(index as i64 * spacing_secs), *distance)
            })
            .collect()
    }

    #[test]
    fn empty_series_yields_zero_snapshot() {
        let snapshot = compute_metrics(&[], THRESHOLD);
        assert_eq!(snapshot, MetricsSnapshot::default());
        assert!(!snapshot.currently_absent);
        assert_eq!(snapshot.current_distance_cm, 0.0);
    }

    #[test]
    fn single_sample_reports_distance_only() {
        let snapshot = compute_metrics(&series(1, &[180.0]), THRESHOLD);
        assert_eq!(snapshot.seconds_absent, 0.0);
        assert_eq!(snapshot.seconds_present, 0.0);
        assert_eq!(snapshot.departure_count, 0);
        assert_eq!(snapshot.current_distance_cm, 180.0);
        assert!(snapshot.currently_absent);
    }

    #[test]
    fn departures_count_rising_edges() {
        let samples = series(1, &[50.0, 50.0, 150.0, 150.0, 150.0, 50.0, 150.0]);
        let snapshot = compute_metrics(&samples, THRESHOLD);

        assert_eq!(snapshot.departure_count, 2);
        // Each pair is classified by its later sample: four absent, two present.
        assert_eq!(snapshot.seconds_absent, 4.0);
        assert_eq!(snapshot.seconds_present, 2.0);
        assert_eq!(snapshot.current_distance_cm, 150.0);
        assert!(snapshot.currently_absent);
    }

    #[test]
    fn long_gap_is_excluded_from_both_buckets() {
        let samples = series(61, &[50.0, 50.0]);
        let snapshot = compute_metrics(&samples, THRESHOLD);
        assert_eq!(snapshot.seconds_absent, 0.0);
        assert_eq!(snapshot.seconds_present, 0.0);
    }

    #[test]
    fn gap_of_exactly_sixty_seconds_is_a_discontinuity() {
        let samples = series(60, &[50.0, 150.0]);
        let snapshot = compute_metrics(&samples, THRESHOLD);
        assert_eq!(snapshot.seconds_absent, 0.0);
        assert_eq!(snapshot.seconds_present, 0.0);
    }

    #[test]
    fn only_outage_intervals_are_dropped() {
        let start = datetime!(2025-11-20 14:00:00 UTC);
        let samples = vec![
            Sample::new(start, 50.0),
            Sample::new(start + Duration::seconds(10), 50.0),
            Sample::new(start + Duration::seconds(300), 150.0),
            Sample::new(start + Duration::seconds(305), 150.0),
            Sample::new(start + Duration::seconds(315), 40.0),
        ];
        let snapshot = compute_metrics(&samples, THRESHOLD);
        assert_eq!(snapshot.seconds_present, 20.0);
        assert_eq!(snapshot.seconds_absent, 5.0);
    }

    #[test]
    fn discontinuity_still_counts_departure() {
        // The gap filter and the edge detector disagree here; both behaviors are kept.
        let samples = series(120, &[50.0, 150.0]);
        let snapshot = compute_metrics(&samples, THRESHOLD);
        assert_eq!(snapshot.seconds_absent, 0.0);
        assert_eq!(snapshot.departure_count, 1);
    }

    #[test]
    fn first_sample_never_counts_as_departure() {
        let samples = series(1, &[150.0, 150.0, 150.0]);
        let snapshot = compute_metrics(&samples, THRESHOLD);
        assert_eq!(snapshot.departure_count, 1);
        assert_eq!(snapshot.seconds_absent, 2.0);

        let snapshot = compute_metrics(&series(1, &[150.0]), THRESHOLD);
        assert_eq!(snapshot.departure_count, 0);
    }

    #[test]
    fn distance_equal_to_threshold_is_present() {
        let snapshot = compute_metrics(&series(2, &[50.0, 120.0]), THRESHOLD);
        assert_eq!(snapshot.seconds_present, 2.0);
        assert_eq!(snapshot.departure_count, 0);
        assert!(!snapshot.currently_absent);
    }

    #[test]
    fn unordered_input_matches_sorted_input() {
        let sorted = series(3, &[40.0, 45.0, 160.0, 170.0, 60.0, 200.0]);
        let mut reversed = sorted.clone();
        reversed.reverse();
        let mut shuffled = sorted.clone();
        shuffled.swap(0, 4);
        shuffled.swap(1, 5);

        let expected = compute_metrics(&sorted, THRESHOLD);
        assert_eq!(compute_metrics(&reversed, THRESHOLD), expected);
        assert_eq!(compute_metrics(&shuffled, THRESHOLD), expected);
        assert_eq!(expected.current_distance_cm, 200.0);
    }

    #[test]
    fn equal_timestamps_keep_input_order() {
        let at = datetime!(2025-11-20 14:00:00 UTC);
        let samples = vec![
            Sample::new(at + Duration::seconds(5), 30.0),
            Sample::new(at, 10.0),
            Sample::new(at, 20.0),
        ];
        let ordered = chronological(&samples);
        let distances: Vec<f64> = ordered.iter().map(|s| s.distance_cm).collect();
        assert_eq!(distances, vec![10.0, 20.0, 30.0]);
    }

    #[test]
    fn sub_second_gaps_accumulate_without_truncation() {
        let start = datetime!(2025-11-20 14:00:00 UTC);
        let samples = vec![
            Sample::new(start, 50.0),
            Sample::new(start + Duration::milliseconds(1500), 50.0),
            Sample::new(start + Duration::milliseconds(2250), 150.0),
        ];
        let snapshot = compute_metrics(&samples, THRESHOLD);
        assert_eq!(snapshot.seconds_present, 1.5);
        assert_eq!(snapshot.seconds_absent, 0.75);
    }

    #[test]
    fn repeated_calls_are_bit_identical() {
        let samples = series(7, &[55.5, 130.25, 130.25, 90.0, 121.0]);
        let first = compute_metrics(&samples, THRESHOLD);
        let second = compute_metrics(&samples, THRESHOLD);
        assert_eq!(first.seconds_absent.to_bits(), second.seconds_absent.to_bits());
        assert_eq!(first.seconds_present.to_bits(), second.seconds_present.to_bits());
        assert_eq!(
            first.current_distance_cm.to_bits(),
            second.current_distance_cm.to_bits()
        );
        assert_eq!(first, second);
    }

    #[test]
    fn nan_distance_is_not_rejected() {
        let snapshot = compute_metrics(&series(1, &[150.0, f64::NAN]), THRESHOLD);
        assert_eq!(snapshot.seconds_present, 1.0);
        assert!(snapshot.current_distance_cm.is_nan());
        assert!(!snapshot.currently_absent);
    }
}
