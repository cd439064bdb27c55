use std::collections::BTreeMap;
use std::path::Path;

use chrono::{DateTime, Duration, TimeZone, Utc};
use tracing::info;

use crate::config::FillMethod;
use crate::error::{PipelineError, Result};

use super::{parse_datetime, RawSeries};

/// Fixed-frequency consumption series after resampling and cleaning.
///
/// Consumption is non-negative and `is_on` marks slots at or above the
/// configured threshold.
#[derive(Debug, Clone, PartialEq)]
pub struct CleanSeries {
    pub timestamps: Vec<DateTime<Utc>>,
    pub consumption: Vec<f64>,
    pub is_on: Vec<bool>,
}

impl CleanSeries {
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    pub fn write_csv(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut writer = csv::Writer::from_path(path)?;
        writer.write_record(["datetime", "consumption", "is_on"])?;
        for i in 0..self.len() {
            writer.write_record([
                self.timestamps[i].to_rfc3339(),
                format!("{}", self.consumption[i]),
                if self.is_on[i] { "1".into() } else { "0".to_string() },
            ])?;
        }
        writer.flush()?;
        info!(path = %path.display(), rows = self.len(), "saved cleaned data");
        Ok(())
    }

    pub fn read_csv(path: &Path) -> Result<Self> {
        let mut reader = csv::Reader::from_path(path).map_err(|_| {
            PipelineError::ArtifactMissing(path.to_path_buf())
        })?;
        let mut timestamps = Vec::new();
        let mut consumption = Vec::new();
        let mut is_on = Vec::new();
        for record in reader.records() {
            let record = record?;
            let ts = parse_datetime(&record[0]).ok_or_else(|| {
                PipelineError::data_format(format!("bad timestamp in {}", path.display()))
            })?;
            let value: f64 = record[1].parse().map_err(|_| {
                PipelineError::data_format(format!("bad consumption in {}", path.display()))
            })?;
            timestamps.push(ts);
            consumption.push(value);
            is_on.push(record.get(2).map(|v| v == "1").unwrap_or(false));
        }
        Ok(Self {
            timestamps,
            consumption,
            is_on,
        })
    }
}

/// Resample a raw series to `freq` buckets (mean within each slot), fill
/// gaps per the configured policy, clip negatives to zero and derive the
/// on/off indicator.
pub fn resample_and_clean(
    raw: &RawSeries,
    freq: Duration,
    fillna: FillMethod,
    threshold_on: f64,
) -> Result<CleanSeries> {
    if raw.is_empty() {
        return Err(PipelineError::data_format("raw series is empty"));
    }
    let step = freq.num_seconds();
    if step <= 0 {
        return Err(PipelineError::configuration("frequency must be positive"));
    }

    // mean per bucket, keyed by floored epoch seconds
    let mut buckets: BTreeMap<i64, (f64, usize)> = BTreeMap::new();
    for (ts, value) in raw.timestamps.iter().zip(&raw.values) {
        let key = ts.timestamp().div_euclid(step) * step;
        let entry = buckets.entry(key).or_insert((0.0, 0));
        entry.0 += value;
        entry.1 += 1;
    }

    let first = *buckets.keys().next().expect("non-empty");
    let last = *buckets.keys().next_back().expect("non-empty");

    let mut timestamps = Vec::new();
    let mut consumption = Vec::new();
    let mut is_on = Vec::new();
    let mut prev = 0.0;
    let mut key = first;
    while key <= last {
        let value = match buckets.get(&key) {
            Some((sum, n)) => sum / *n as f64,
            None => match fillna {
                FillMethod::Zero => 0.0,
                FillMethod::Ffill => prev,
            },
        };
        let value = value.max(0.0);
        prev = value;
        timestamps.push(Utc.timestamp_opt(key, 0).unwrap());
        consumption.push(value);
        is_on.push(value >= threshold_on);
        key += step;
    }

    Ok(CleanSeries {
        timestamps,
        consumption,
        is_on,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::parse_freq;

    fn raw(points: &[(&str, f64)]) -> RawSeries {
        RawSeries {
            timestamps: points
                .iter()
                .map(|(s, _)| parse_datetime(s).unwrap())
                .collect(),
            values: points.iter().map(|(_, v)| *v).collect(),
        }
    }

    #[test]
    fn averages_within_slots_and_fills_gaps_with_zero() {
        let series = raw(&[
            ("2024-01-01 00:01:00", 1.0),
            ("2024-01-01 00:07:00", 3.0),
            // 00:15 slot missing entirely
            ("2024-01-01 00:30:00", 4.0),
        ]);
        let clean =
            resample_and_clean(&series, parse_freq("15T").unwrap(), FillMethod::Zero, 0.5).unwrap();
        assert_eq!(clean.len(), 3);
        assert_eq!(clean.consumption, vec![2.0, 0.0, 4.0]);
        assert_eq!(clean.is_on, vec![true, false, true]);
    }

    #[test]
    fn forward_fill_carries_last_value() {
        let series = raw(&[
            ("2024-01-01 00:00:00", 2.0),
            ("2024-01-01 00:45:00", 6.0),
        ]);
        let clean =
            resample_and_clean(&series, parse_freq("15T").unwrap(), FillMethod::Ffill, 0.5).unwrap();
        assert_eq!(clean.consumption, vec![2.0, 2.0, 2.0, 6.0]);
    }

    #[test]
    fn clips_negative_consumption() {
        let series = raw(&[("2024-01-01 00:00:00", -5.0)]);
        let clean =
            resample_and_clean(&series, parse_freq("15T").unwrap(), FillMethod::Zero, 0.5).unwrap();
        assert_eq!(clean.consumption, vec![0.0]);
    }

    #[test]
    fn csv_round_trip() {
        let series = raw(&[
            ("2024-01-01 00:00:00", 1.0),
            ("2024-01-01 00:15:00", 0.0),
        ]);
        let clean =
            resample_and_clean(&series, parse_freq("15T").unwrap(), FillMethod::Zero, 0.5).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clean_data.csv");
        clean.write_csv(&path).unwrap();
        let loaded = CleanSeries::read_csv(&path).unwrap();
        assert_eq!(clean, loaded);
    }

    #[test]
    fn missing_file_is_artifact_missing() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            CleanSeries::read_csv(&dir.path().join("nope.csv")),
            Err(PipelineError::ArtifactMissing(_))
        ));
    }
}
