//! Sequence model for the recurrent family.
//!
//! A full recurrent network would need a deep-learning framework; this
//! model keeps the family's data contract (fixed-length lookback windows
//! built by the sequence builder) and fits one weight per window cell by
//! full-batch gradient descent.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::RecurrentConfig;
use crate::error::{PipelineError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecurrentModel {
    pub lookback: usize,
    pub feature_names: Vec<String>,
    /// Per-column fill values (training means, model input space) for
    /// serve-time window reconstruction.
    pub fill_values: Vec<f64>,
    /// Row-major weights, `lookback * feature_names.len()` entries.
    pub weights: Vec<f64>,
    pub intercept: f64,
    pub trained_at: DateTime<Utc>,
}

impl RecurrentModel {
    /// Train on windows from the sequence builder. Malformed input
    /// propagates; this family is not skipped on error.
    pub fn train(
        windows: &[Vec<Vec<f64>>],
        labels: &[f64],
        cfg: &RecurrentConfig,
        feature_names: Vec<String>,
    ) -> Result<Self> {
        if windows.is_empty() {
            return Err(PipelineError::data_format("no training windows"));
        }
        if windows.len() != labels.len() {
            return Err(PipelineError::data_format(format!(
                "window and label count mismatch: {} vs {}",
                windows.len(),
                labels.len()
            )));
        }
        let lookback = windows[0].len();
        let n_features = feature_names.len();
        let flat: Vec<Vec<f64>> = windows
            .iter()
            .map(|w| flatten_window(w, lookback, n_features))
            .collect::<Result<_>>()?;
        let n_weights = lookback * n_features;

        let mut weights = vec![0.0; n_weights];
        let mut intercept = 0.0;
        let n = flat.len() as f64;
        // step size normalized by the mean squared window norm so the
        // descent stays stable for any lookback/feature count
        let mean_sq_norm = flat
            .iter()
            .map(|r| r.iter().map(|v| v * v).sum::<f64>())
            .sum::<f64>()
            / n
            + 1.0;
        let step = cfg.learning_rate / mean_sq_norm;
        for _epoch in 0..cfg.epochs {
            let mut weight_grads = vec![0.0; n_weights];
            let mut intercept_grad = 0.0;
            for (features, target) in flat.iter().zip(labels) {
                let prediction: f64 = features
                    .iter()
                    .zip(&weights)
                    .map(|(f, w)| f * w)
                    .sum::<f64>()
                    + intercept;
                let error = prediction - target;
                for (g, f) in weight_grads.iter_mut().zip(features) {
                    *g += error * f / n;
                }
                intercept_grad += error / n;
            }
            for (w, g) in weights.iter_mut().zip(&weight_grads) {
                *w -= step * g;
            }
            intercept -= step * intercept_grad;
        }

        let mut fill_values = vec![0.0; n_features];
        let mut cells = 0usize;
        for window in windows {
            for row in window {
                for (f, v) in fill_values.iter_mut().zip(row) {
                    *f += v;
                }
                cells += 1;
            }
        }
        for f in &mut fill_values {
            *f /= cells as f64;
        }

        info!(
            windows = windows.len(),
            lookback,
            n_features,
            epochs = cfg.epochs,
            "sequence model trained"
        );
        Ok(Self {
            lookback,
            feature_names,
            fill_values,
            weights,
            intercept,
            trained_at: Utc::now(),
        })
    }

    pub fn predict_window(&self, window: &[Vec<f64>]) -> Result<f64> {
        let features = flatten_window(window, self.lookback, self.feature_names.len())?;
        Ok(features
            .iter()
            .zip(&self.weights)
            .map(|(f, w)| f * w)
            .sum::<f64>()
            + self.intercept)
    }

    pub fn predict_windows(&self, windows: &[Vec<Vec<f64>>]) -> Result<Vec<f64>> {
        windows.iter().map(|w| self.predict_window(w)).collect()
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_vec_pretty(self)?)?;
        info!(path = %path.display(), "saved sequence model");
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)
            .map_err(|_| PipelineError::ArtifactMissing(path.to_path_buf()))?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

fn flatten_window(window: &[Vec<f64>], lookback: usize, n_features: usize) -> Result<Vec<f64>> {
    if window.len() != lookback {
        return Err(PipelineError::inference(format!(
            "window length mismatch: expected {lookback}, got {}",
            window.len()
        )));
    }
    let mut flat = Vec::with_capacity(lookback * n_features);
    for row in window {
        if row.len() != n_features {
            return Err(PipelineError::inference(format!(
                "feature count mismatch: expected {n_features}, got {}",
                row.len()
            )));
        }
        flat.extend_from_slice(row);
    }
    Ok(flat)
}
