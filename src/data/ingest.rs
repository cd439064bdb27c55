use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::config::DataConfig;
use crate::error::{PipelineError, Result};

use super::{parse_date_time, parse_datetime};

/// One chronologically ordered consumption series, assembled from raw files.
///
/// Timestamps are strictly increasing: rows are sorted and duplicate
/// timestamps are collapsed by averaging.
#[derive(Debug, Clone, PartialEq)]
pub struct RawSeries {
    pub timestamps: Vec<DateTime<Utc>>,
    pub values: Vec<f64>,
}

impl RawSeries {
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }
}

/// Read every `*.csv` under `raw_dir` (lexicographic order) and concatenate
/// the records into one sorted, deduplicated series.
///
/// Each file must either carry the configured date and time columns, or a
/// combined `datetime` column. Rows whose timestamp fails to parse are
/// dropped; a missing consumption column is a hard error.
pub fn read_and_concat(raw_dir: &Path, data_cfg: &DataConfig) -> Result<RawSeries> {
    let files = list_csv_files(raw_dir)?;
    if files.is_empty() {
        return Err(PipelineError::data_format(format!(
            "no CSV files found in {}",
            raw_dir.display()
        )));
    }

    let mut rows: Vec<(DateTime<Utc>, f64)> = Vec::new();
    for file in &files {
        info!(file = %file.display(), "loading raw file");
        read_file(file, data_cfg, &mut rows)?;
    }

    rows.sort_by_key(|(ts, _)| *ts);

    // collapse duplicate timestamps by averaging
    let mut timestamps = Vec::with_capacity(rows.len());
    let mut values = Vec::with_capacity(rows.len());
    let mut i = 0;
    while i < rows.len() {
        let ts = rows[i].0;
        let mut sum = 0.0;
        let mut n = 0usize;
        while i < rows.len() && rows[i].0 == ts {
            sum += rows[i].1;
            n += 1;
            i += 1;
        }
        timestamps.push(ts);
        values.push(sum / n as f64);
    }

    info!(rows = timestamps.len(), files = files.len(), "raw series assembled");
    Ok(RawSeries { timestamps, values })
}

fn list_csv_files(raw_dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let entries = std::fs::read_dir(raw_dir).map_err(|e| {
        PipelineError::data_format(format!("cannot read raw dir {}: {e}", raw_dir.display()))
    })?;
    for entry in entries {
        let path = entry?.path();
        if path.extension().and_then(|e| e.to_str()) == Some("csv") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn read_file(path: &Path, cfg: &DataConfig, out: &mut Vec<(DateTime<Utc>, f64)>) -> Result<()> {
    let mut reader = csv::Reader::from_path(path)?;
    let headers = reader.headers()?.clone();
    let col = |name: &str| headers.iter().position(|h| h == name);

    let date_idx = col(&cfg.datetime_cols.date_col);
    let time_idx = col(&cfg.datetime_cols.time_col);
    let datetime_idx = col("datetime");
    let value_idx = col(&cfg.consumption_col).ok_or_else(|| {
        PipelineError::data_format(format!(
            "{} not found in {}",
            cfg.consumption_col,
            path.display()
        ))
    })?;

    if date_idx.is_none() && datetime_idx.is_none() {
        return Err(PipelineError::data_format(format!(
            "no datetime columns found in file: {}",
            path.display()
        )));
    }

    let mut dropped = 0usize;
    for record in reader.records() {
        let record = record?;
        let ts = match (date_idx, time_idx, datetime_idx) {
            (Some(d), Some(t), _) => {
                parse_date_time(&record[d], &record[t], cfg.dayfirst)
            }
            (_, _, Some(dt)) => parse_datetime(&record[dt]),
            _ => None,
        };
        let value = record
            .get(value_idx)
            .and_then(|v| v.trim().parse::<f64>().ok());
        match (ts, value) {
            (Some(ts), Some(v)) => out.push((ts, v)),
            _ => dropped += 1,
        }
    }
    if dropped > 0 {
        debug!(file = %path.display(), dropped, "dropped unparsable rows");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DatetimeCols;
    use std::fs;

    fn data_cfg() -> DataConfig {
        DataConfig {
            datetime_cols: DatetimeCols {
                date_col: "TxnDate".into(),
                time_col: "TxnTime".into(),
            },
            consumption_col: "Consumption".into(),
            dayfirst: true,
            resample_freq: "15T".into(),
            fillna_method: crate::config::FillMethod::Zero,
            threshold_on: 0.05,
        }
    }

    #[test]
    fn concatenates_sorts_and_dedups() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("b.csv"),
            "TxnDate,TxnTime,Consumption\n02/01/2024,00:15:00,2.0\n02/01/2024,00:00:00,1.0\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("a.csv"),
            "TxnDate,TxnTime,Consumption\n01/01/2024,23:45:00,0.5\n02/01/2024,00:00:00,3.0\n",
        )
        .unwrap();

        let series = read_and_concat(dir.path(), &data_cfg()).unwrap();
        assert_eq!(series.len(), 3);
        assert!(series.timestamps.windows(2).all(|w| w[0] < w[1]));
        // duplicate 00:00 rows averaged
        assert_eq!(series.values[1], 2.0);
    }

    #[test]
    fn accepts_combined_datetime_column() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("c.csv"),
            "datetime,Consumption\n2024-01-01 00:00:00,1.5\nnot-a-date,9.9\n",
        )
        .unwrap();

        let series = read_and_concat(dir.path(), &data_cfg()).unwrap();
        assert_eq!(series.len(), 1);
        assert_eq!(series.values[0], 1.5);
    }

    #[test]
    fn empty_dir_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            read_and_concat(dir.path(), &data_cfg()),
            Err(PipelineError::DataFormat(_))
        ));
    }

    #[test]
    fn missing_consumption_column_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("d.csv"),
            "TxnDate,TxnTime,Power\n01/01/2024,00:00:00,1.0\n",
        )
        .unwrap();
        let err = read_and_concat(dir.path(), &data_cfg()).unwrap_err();
        assert!(err.to_string().contains("Consumption"));
    }

    #[test]
    fn missing_datetime_columns_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("e.csv"), "Consumption\n1.0\n").unwrap();
        assert!(matches!(
            read_and_concat(dir.path(), &data_cfg()),
            Err(PipelineError::DataFormat(_))
        ));
    }
}
