//! Feature engineering over the cleaned consumption series.
//!
//! Calendar features come from the timestamp index; lag and rolling-window
//! features come from the consumption column using only past values. Rows
//! with residual missing values after lagging are dropped, shrinking the
//! usable frame by `max(lag)` rows at the head.

pub mod calendar;
pub mod frame;
pub mod lags;
pub mod scaler;

pub use frame::FeatureFrame;
pub use scaler::Scaler;

use tracing::info;

use crate::config::TrainingConfig;
use crate::data::CleanSeries;
use crate::error::{PipelineError, Result};

use calendar::{calendar_row, CALENDAR_COLUMNS};
use lags::{lag_column, lag_name, roll_name, shifted_rolling_mean};

pub const TARGET_SOURCE_COLUMN: &str = "consumption";

/// Build the full feature frame from a cleaned series and scale the
/// regressor columns per config. The target column is never scaled.
///
/// Returns the frame (target column last) and the fitted scaler, if any.
pub fn build_features(
    clean: &CleanSeries,
    training: &TrainingConfig,
) -> Result<(FeatureFrame, Option<Scaler>)> {
    let frame = assemble_frame(clean, &training.lags, &training.roll_windows)?;

    if frame.column_index(&training.target_col).is_none() {
        return Err(PipelineError::configuration(format!(
            "target column '{}' not found",
            training.target_col
        )));
    }

    let (mut x, y, x_cols) = frame.split_xy(&training.target_col)?;
    let fitted = Scaler::fit(training.scale_method, &x);
    if let Some(scaler) = &fitted {
        scaler.transform_rows(&mut x);
    }

    // reassemble with scaled regressors and the raw target last
    let mut columns = x_cols;
    columns.push(training.target_col.clone());
    let rows = x
        .into_iter()
        .zip(y)
        .map(|(mut row, target)| {
            row.push(target);
            row
        })
        .collect();

    info!(
        rows = frame.len(),
        scaled = fitted.is_some(),
        "feature frame built"
    );
    Ok((
        FeatureFrame {
            timestamps: frame.timestamps,
            columns,
            rows,
        },
        fitted,
    ))
}

/// Unscaled frame: is_on + calendar + lag/rolling columns + consumption.
fn assemble_frame(
    clean: &CleanSeries,
    lag_steps: &[usize],
    roll_windows: &[usize],
) -> Result<FeatureFrame> {
    if clean.is_empty() {
        return Err(PipelineError::data_format("cleaned series is empty"));
    }

    let mut columns = vec!["is_on".to_string()];
    columns.extend(CALENDAR_COLUMNS.iter().map(|c| c.to_string()));
    columns.extend(lag_steps.iter().map(|k| lag_name(*k)));
    columns.extend(roll_windows.iter().map(|w| roll_name(*w)));
    columns.push(TARGET_SOURCE_COLUMN.to_string());

    let lag_cols: Vec<Vec<Option<f64>>> = lag_steps
        .iter()
        .map(|k| lag_column(&clean.consumption, *k))
        .collect();
    let roll_cols: Vec<Vec<Option<f64>>> = roll_windows
        .iter()
        .map(|w| shifted_rolling_mean(&clean.consumption, *w))
        .collect();

    let mut timestamps = Vec::new();
    let mut rows = Vec::new();
    'row: for t in 0..clean.len() {
        let mut row = Vec::with_capacity(columns.len());
        row.push(if clean.is_on[t] { 1.0 } else { 0.0 });
        row.extend(calendar_row(clean.timestamps[t]));
        for col in &lag_cols {
            match col[t] {
                Some(v) => row.push(v),
                None => continue 'row,
            }
        }
        for col in &roll_cols {
            match col[t] {
                Some(v) => row.push(v),
                None => continue 'row,
            }
        }
        row.push(clean.consumption[t]);
        timestamps.push(clean.timestamps[t]);
        rows.push(row);
    }

    Ok(FeatureFrame {
        timestamps,
        columns,
        rows,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScaleMethod;
    use chrono::{Duration, TimeZone, Utc};

    fn clean_series(n: usize) -> CleanSeries {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let consumption: Vec<f64> = (0..n).map(|i| i as f64).collect();
        CleanSeries {
            timestamps: (0..n)
                .map(|i| start + Duration::minutes(15 * i as i64))
                .collect(),
            is_on: consumption.iter().map(|v| *v >= 0.5).collect(),
            consumption,
        }
    }

    fn training(lags: Vec<usize>, rolls: Vec<usize>, scale: ScaleMethod) -> TrainingConfig {
        TrainingConfig {
            target_col: "consumption".into(),
            test_size_days: 1,
            scale_method: scale,
            lags,
            roll_windows: rolls,
            lookback: 4,
        }
    }

    #[test]
    fn head_shrinks_by_max_lag() {
        let clean = clean_series(20);
        let (frame, _) =
            build_features(&clean, &training(vec![1, 4], vec![2], ScaleMethod::None)).unwrap();
        assert_eq!(frame.len(), 16);
        // first surviving row is index 4 of the original series
        assert_eq!(frame.timestamps[0], clean.timestamps[4]);
    }

    #[test]
    fn no_leakage_in_lag_columns() {
        let clean = clean_series(30);
        let (frame, _) =
            build_features(&clean, &training(vec![1, 3], vec![4], ScaleMethod::None)).unwrap();
        let lag1 = frame.column("lag_1").unwrap();
        let target = frame.column("consumption").unwrap();
        for t in 0..frame.len() {
            // target is i as f64, so lag_1 must equal target - 1
            assert_eq!(lag1[t], target[t] - 1.0);
        }
    }

    #[test]
    fn rolling_column_is_shifted() {
        let clean = clean_series(10);
        let (frame, _) =
            build_features(&clean, &training(vec![1], vec![2], ScaleMethod::None)).unwrap();
        let roll = frame.column("roll_mean_2").unwrap();
        let target = frame.column("consumption").unwrap();
        // mean of the two previous values of a ramp = target - 1.5
        for t in 1..frame.len() {
            assert!((roll[t] - (target[t] - 1.5)).abs() < 1e-9);
        }
    }

    #[test]
    fn target_column_stays_raw_when_scaling() {
        let clean = clean_series(20);
        let (frame, scaler) =
            build_features(&clean, &training(vec![1], vec![2], ScaleMethod::Standard)).unwrap();
        assert!(scaler.is_some());
        let target = frame.column("consumption").unwrap();
        assert_eq!(*target.last().unwrap(), 19.0);
        // a scaled regressor column has near-zero mean
        let lag = frame.column("lag_1").unwrap();
        let mean: f64 = lag.iter().sum::<f64>() / lag.len() as f64;
        assert!(mean.abs() < 1e-9);
    }

    #[test]
    fn unknown_target_is_configuration_error() {
        let clean = clean_series(10);
        let mut cfg = training(vec![1], vec![2], ScaleMethod::None);
        cfg.target_col = "load_kw".into();
        assert!(matches!(
            build_features(&clean, &cfg),
            Err(PipelineError::Configuration(_))
        ));
    }
}
