use std::path::Path;

use chrono::{DateTime, Utc};
use tracing::info;

use crate::data::parse_datetime;
use crate::error::{PipelineError, Result};

/// Timestamp-indexed numeric frame: calendar and lag/rolling columns plus
/// the target column, one row per resampled slot.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureFrame {
    pub timestamps: Vec<DateTime<Utc>>,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<f64>>,
}

impl FeatureFrame {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Copy of the named column.
    pub fn column(&self, name: &str) -> Option<Vec<f64>> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(|r| r[idx]).collect())
    }

    /// Rows `[start, end)` as a new frame; ordering preserved.
    pub fn slice(&self, start: usize, end: usize) -> Self {
        Self {
            timestamps: self.timestamps[start..end].to_vec(),
            columns: self.columns.clone(),
            rows: self.rows[start..end].to_vec(),
        }
    }

    /// Split into the regressor matrix and the target vector.
    ///
    /// Fails with a configuration error when the declared target column is
    /// absent from the frame.
    pub fn split_xy(&self, target_col: &str) -> Result<(Vec<Vec<f64>>, Vec<f64>, Vec<String>)> {
        let target_idx = self.column_index(target_col).ok_or_else(|| {
            PipelineError::configuration(format!("target column '{target_col}' not found"))
        })?;
        let x_cols: Vec<String> = self
            .columns
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != target_idx)
            .map(|(_, c)| c.clone())
            .collect();
        let mut x = Vec::with_capacity(self.len());
        let mut y = Vec::with_capacity(self.len());
        for row in &self.rows {
            let mut xr = Vec::with_capacity(row.len() - 1);
            for (i, v) in row.iter().enumerate() {
                if i == target_idx {
                    y.push(*v);
                } else {
                    xr.push(*v);
                }
            }
            x.push(xr);
        }
        Ok((x, y, x_cols))
    }

    pub fn write_csv(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut writer = csv::Writer::from_path(path)?;
        let mut header = vec!["datetime".to_string()];
        header.extend(self.columns.iter().cloned());
        writer.write_record(&header)?;
        for (ts, row) in self.timestamps.iter().zip(&self.rows) {
            let mut record = vec![ts.to_rfc3339()];
            record.extend(row.iter().map(|v| format!("{v}")));
            writer.write_record(&record)?;
        }
        writer.flush()?;
        info!(path = %path.display(), rows = self.len(), cols = self.columns.len(), "saved features");
        Ok(())
    }

    pub fn read_csv(path: &Path) -> Result<Self> {
        let mut reader = csv::Reader::from_path(path)
            .map_err(|_| PipelineError::ArtifactMissing(path.to_path_buf()))?;
        let columns: Vec<String> = reader
            .headers()?
            .iter()
            .skip(1)
            .map(|h| h.to_string())
            .collect();
        let mut timestamps = Vec::new();
        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            let ts = parse_datetime(&record[0]).ok_or_else(|| {
                PipelineError::data_format(format!("bad timestamp in {}", path.display()))
            })?;
            let row: std::result::Result<Vec<f64>, _> =
                record.iter().skip(1).map(|v| v.parse::<f64>()).collect();
            let row = row.map_err(|_| {
                PipelineError::data_format(format!("non-numeric cell in {}", path.display()))
            })?;
            if row.len() != columns.len() {
                return Err(PipelineError::data_format(format!(
                    "ragged row in {}",
                    path.display()
                )));
            }
            timestamps.push(ts);
            rows.push(row);
        }
        Ok(Self {
            timestamps,
            columns,
            rows,
        })
    }
}
