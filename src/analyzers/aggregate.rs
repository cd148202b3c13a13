use crate::analyzers::types::{Aggregate, SeriesSummary};
use crate::analyzers::utility::{mean, stddev};
use crate::reading::{Field, Measurement, Reading};

/// Collects the valid values of `field`, in series order.
fn valid_values(series: &[Reading], field: Field) -> Vec<f64> {
    series
        .iter()
        .filter_map(|r| r.get(field).value())
        .collect()
}

/// Mean of `field` over the entries where it is a finite number.
///
/// Invalid entries are skipped rather than counted as zero; duplicates are
/// not collapsed. With no valid entry, or when the finite inputs overflow,
/// the result is [`Aggregate::NoData`].
pub fn mean_of(series: &[Reading], field: Field) -> Aggregate {
    match mean(&valid_values(series, field)) {
        Some(avg) => Aggregate::Value(avg),
        None => Aggregate::NoData,
    }
}

/// Number of entries where `field` is a finite number.
pub fn valid_count(series: &[Reading], field: Field) -> usize {
    series.iter().filter(|r| r.get(field).is_valid()).count()
}

/// Count, mean, extremes and population standard deviation of `field`.
///
/// `None` when no entry is valid or the statistics overflow.
pub fn summarize(series: &[Reading], field: Field) -> Option<SeriesSummary> {
    let values = valid_values(series, field);
    let avg = mean(&values)?;

    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    Some(SeriesSummary {
        field,
        count: values.len(),
        mean: avg,
        min,
        max,
        stddev: stddev(&values, avg)?,
    })
}

/// The most recent valid value of `field`.
///
/// Entries are compared by timestamp; among entries without one, later
/// positions win.
pub fn latest_valid(series: &[Reading], field: Field) -> Measurement {
    series
        .iter()
        .enumerate()
        .filter(|(_, r)| r.get(field).is_valid())
        .max_by_key(|(i, r)| (r.timestamp, *i))
        .map(|(_, r)| r.get(field))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{ValueKind, parse_reading};
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    fn pm(value: f64) -> Reading {
        Reading {
            pm25: Measurement::new(value),
            ..Default::default()
        }
    }

    #[test]
    fn test_mean_of_empty_is_no_data() {
        assert_eq!(mean_of(&[], Field::Pm25), Aggregate::NoData);
    }

    #[test]
    fn test_mean_of_skips_invalid_entries() {
        let series: Vec<Reading> = [json!({"pm25": "20"}), json!({"pm25": "bad"}), json!({"pm25": 40})]
            .iter()
            .map(|v| parse_reading(v, ValueKind::Pm25).unwrap())
            .collect();

        assert_eq!(mean_of(&series, Field::Pm25), Aggregate::Value(30.0));
        assert_eq!(valid_count(&series, Field::Pm25), 2);
    }

    #[test]
    fn test_mean_of_overflow_is_no_data() {
        let series: Vec<Reading> = [json!({"pm25": "1e308"}), json!({"pm25": 1e308})]
            .iter()
            .map(|v| parse_reading(v, ValueKind::Pm25).unwrap())
            .collect();

        assert_eq!(valid_count(&series, Field::Pm25), 2);
        assert_eq!(mean_of(&series, Field::Pm25), Aggregate::NoData);
        assert_eq!(mean_of(&series, Field::Pm25).display(1), "N/D");
        assert!(summarize(&series, Field::Pm25).is_none());
    }

    #[test]
    fn test_mean_of_all_invalid_is_no_data() {
        let series = vec![Reading::unavailable(), Reading::unavailable()];
        assert_eq!(mean_of(&series, Field::Temperature), Aggregate::NoData);
        assert!(summarize(&series, Field::Temperature).is_none());
    }

    #[test]
    fn test_mean_of_order_and_duplicates() {
        let forward = vec![pm(10.0), pm(20.0), pm(20.0), pm(50.0)];
        let mut backward = forward.clone();
        backward.reverse();

        assert_eq!(mean_of(&forward, Field::Pm25), Aggregate::Value(25.0));
        assert_eq!(mean_of(&backward, Field::Pm25), mean_of(&forward, Field::Pm25));
    }

    #[test]
    fn test_summarize() {
        let series = vec![pm(10.0), pm(30.0), Reading::unavailable()];
        let summary = summarize(&series, Field::Pm25).unwrap();

        assert_eq!(summary.count, 2);
        assert_eq!(summary.mean, 20.0);
        assert_eq!(summary.min, 10.0);
        assert_eq!(summary.max, 30.0);
        assert_eq!(summary.stddev, 10.0);
    }

    #[test]
    fn test_latest_valid_prefers_newest_timestamp() {
        let at = |h| Some(Utc.with_ymd_and_hms(2025, 3, 1, h, 0, 0).unwrap());
        let series = vec![
            Reading { timestamp: at(11), ..pm(30.0) },
            Reading { timestamp: at(9), ..pm(10.0) },
            Reading { timestamp: at(12), ..Reading::unavailable() },
        ];

        assert_eq!(latest_valid(&series, Field::Pm25).value(), Some(30.0));
        assert!(!latest_valid(&[], Field::Pm25).is_valid());
    }
}
