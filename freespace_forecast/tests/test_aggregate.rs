use chrono::{Duration, NaiveDate, NaiveDateTime, TimeZone};
use chrono_tz::Europe::Zurich;
use freespace_forecast::grid::{regular_period, GridBuilder};
use freespace_forecast::{ForecastAggregator, ForecastPoint};
use pretty_assertions::assert_eq;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rstest::rstest;

fn opening_slots(days: u64) -> Vec<NaiveDateTime> {
    let first = NaiveDate::from_ymd_opt(2024, 6, 3).unwrap();
    GridBuilder::half_hourly()
        .build_day_range(first, first + chrono::Days::new(days - 1))
        .into_iter()
        .filter(|slot| regular_period(slot).is_some())
        .collect()
}

/// Model output deliberately spilling outside the percentage range
fn noisy_points(seed: u64) -> Vec<ForecastPoint> {
    let mut rng = StdRng::seed_from_u64(seed);
    opening_slots(3)
        .into_iter()
        .map(|slot| {
            let mean = rng.gen_range(-30.0..130.0);
            let spread = rng.gen_range(0.0..25.0);
            ForecastPoint::new(slot, mean, mean - spread, mean + spread)
        })
        .collect()
}

#[rstest]
#[case(1)]
#[case(7)]
#[case(2024)]
fn test_clipped_values_stay_in_range(#[case] seed: u64) {
    let days = ForecastAggregator::new(Zurich).aggregate(&noisy_points(seed));
    assert_eq!(days.len(), 3);
    for day in days.values() {
        for detail in &day.predictions {
            for value in [
                detail.predicted_freespace_percentage,
                detail.lower_bound,
                detail.upper_bound,
            ] {
                assert!((0.0..=100.0).contains(&value), "{} out of range", value);
            }
        }
        for period in day.periods.values() {
            assert!((0.0..=100.0).contains(&period.predicted_freespace_percentage));
        }
    }
}

#[test]
fn test_aggregation_is_idempotent() {
    let points = noisy_points(11);
    let aggregator = ForecastAggregator::new(Zurich);
    let first = aggregator.aggregate(&points);
    let second = aggregator.aggregate(&points);

    assert_eq!(first.len(), second.len());
    for (a, b) in first.values().zip(second.values()) {
        assert_eq!(a.predictions, b.predictions);
        assert_eq!(a.periods, b.periods);
    }
}

#[test]
fn test_period_counts_match_slots_per_window() {
    let points = noisy_points(5);
    let now = Zurich.with_ymd_and_hms(2024, 6, 3, 5, 0, 0).unwrap();
    let days = ForecastAggregator::new(Zurich).aggregate_at(&points, now);

    // [hours per window] x 2 slots per hour
    let expected = [6, 4, 4, 6, 6, 6];
    for day in days.values() {
        let counts: Vec<usize> = day.periods.values().map(|p| p.count).collect();
        assert_eq!(counts, expected);
        let total: usize = counts.iter().sum();
        assert_eq!(total, day.predictions.len());
    }
}

#[test]
fn test_average_uses_unrounded_sum() {
    let slot = NaiveDate::from_ymd_opt(2024, 6, 3)
        .unwrap()
        .and_hms_opt(19, 0, 0)
        .unwrap();
    // rounded per slot these would be 10.05 each and average to 10.1
    let points: Vec<ForecastPoint> = [10.046, 10.046]
        .iter()
        .enumerate()
        .map(|(i, &mean)| {
            ForecastPoint::new(slot + Duration::minutes(30 * i as i64), mean, mean, mean)
        })
        .collect();
    let days = ForecastAggregator::new(Zurich).aggregate(&points);
    let evening = days.values().next().unwrap().periods.values().next().unwrap();

    assert_eq!(evening.count, 2);
    assert!((evening.total - 20.092).abs() < 1e-9);
    assert_eq!(evening.predicted_freespace_percentage, 10.0);
    assert_eq!(days.values().next().unwrap().predictions[0].predicted_freespace_percentage, 10.05);
}
