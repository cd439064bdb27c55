use chrono::Duration;

use crate::error::{PipelineError, Result};
use crate::features::FeatureFrame;

/// Number of resampled slots in a 24-hour span.
///
/// The frequency must divide one day evenly; anything else is rejected
/// rather than silently truncated.
pub fn periods_per_day(freq: Duration) -> Result<usize> {
    let day = Duration::days(1).num_seconds();
    let step = freq.num_seconds();
    if step <= 0 {
        return Err(PipelineError::configuration("frequency must be positive"));
    }
    if day % step != 0 {
        return Err(PipelineError::configuration(format!(
            "frequency of {step}s does not divide one day evenly"
        )));
    }
    Ok((day / step) as usize)
}

/// Partition a frame into (train, test) where test is the trailing
/// `test_days` window. No shuffling: ordering is semantic, train rows all
/// precede test rows in time.
pub fn time_train_test_split(
    frame: &FeatureFrame,
    test_days: usize,
    freq: Duration,
) -> Result<(FeatureFrame, FeatureFrame)> {
    let test_periods = test_days * periods_per_day(freq)?;
    if test_periods == 0 {
        return Err(PipelineError::configuration(
            "test window must cover at least one period",
        ));
    }
    if test_periods >= frame.len() {
        return Err(PipelineError::configuration(format!(
            "test window of {test_periods} rows leaves no training rows (frame has {})",
            frame.len()
        )));
    }
    let cut = frame.len() - test_periods;
    Ok((frame.slice(0, cut), frame.slice(cut, frame.len())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::parse_freq;
    use chrono::{TimeZone, Utc};
    use proptest::prelude::*;

    fn frame(n: usize) -> FeatureFrame {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        FeatureFrame {
            timestamps: (0..n)
                .map(|i| start + Duration::hours(i as i64))
                .collect(),
            columns: vec!["consumption".into()],
            rows: (0..n).map(|i| vec![i as f64]).collect(),
        }
    }

    #[test]
    fn periods_per_day_for_common_frequencies() {
        assert_eq!(periods_per_day(parse_freq("15T").unwrap()).unwrap(), 96);
        assert_eq!(periods_per_day(parse_freq("1H").unwrap()).unwrap(), 24);
        assert_eq!(periods_per_day(parse_freq("1D").unwrap()).unwrap(), 1);
    }

    #[test]
    fn uneven_frequency_is_rejected() {
        assert!(matches!(
            periods_per_day(parse_freq("7T").unwrap()),
            Err(PipelineError::Configuration(_))
        ));
    }

    #[test]
    fn split_partitions_without_overlap() {
        let f = frame(100);
        let (train, test) = time_train_test_split(&f, 2, parse_freq("1H").unwrap()).unwrap();
        assert_eq!(train.len() + test.len(), 100);
        assert_eq!(test.len(), 48);
        assert!(train.timestamps.last().unwrap() < test.timestamps.first().unwrap());
    }

    #[test]
    fn oversized_test_window_is_rejected() {
        let f = frame(24);
        assert!(matches!(
            time_train_test_split(&f, 1, parse_freq("1H").unwrap()),
            Err(PipelineError::Configuration(_))
        ));
    }

    proptest! {
        #[test]
        fn lengths_always_sum_and_order_is_kept(n in 30usize..500, test_days in 1usize..10) {
            let f = frame(n);
            let freq = parse_freq("1H").unwrap();
            match time_train_test_split(&f, test_days, freq) {
                Ok((train, test)) => {
                    prop_assert_eq!(train.len() + test.len(), n);
                    prop_assert_eq!(test.len(), test_days * 24);
                    prop_assert!(train.timestamps.last().unwrap() < test.timestamps.first().unwrap());
                }
                Err(_) => prop_assert!(test_days * 24 >= n),
            }
        }
    }
}
