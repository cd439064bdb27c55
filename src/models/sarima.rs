//! Seasonal autoregressive model for the statistical family.
//!
//! The configured `(p, d, q)(P, D, Q, s)` orders are honored for their
//! autoregressive and differencing parts: the series is differenced `d`
//! times and seasonally differenced `D` times, then regressed on lags
//! `1..=p` and `s, 2s, ..., P*s` by least squares. Moving-average terms are
//! accepted in config but not modelled. Forecasts are recursive, with the
//! differencing integrated back afterwards.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::SarimaConfig;
use crate::error::{PipelineError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SarimaModel {
    pub order: [usize; 3],
    pub seasonal_order: [usize; 4],
    /// Coefficients aligned with `lags`, intercept last conceptually kept
    /// separate.
    pub coefficients: Vec<f64>,
    pub intercept: f64,
    /// Lag offsets (in differenced space) the coefficients apply to.
    lags: Vec<usize>,
    /// Raw history tail, long enough to rebuild the differencing state.
    tail: Vec<f64>,
    pub trained_at: DateTime<Utc>,
}

impl SarimaModel {
    /// Fit on a training series. Insufficient data or a degenerate system
    /// is an error; the caller decides whether to skip the family.
    pub fn fit(y: &[f64], cfg: &SarimaConfig) -> Result<Self> {
        let [p, d, q] = cfg.order;
        let [sp, sd, sq, season] = cfg.seasonal_order;
        if q > 0 || sq > 0 {
            debug!(q, sq, "moving-average terms are not modelled; ignoring");
        }
        if season == 0 && (sp > 0 || sd > 0) {
            return Err(PipelineError::configuration(
                "seasonal order requires a non-zero season length",
            ));
        }

        let mut lags: Vec<usize> = (1..=p).collect();
        for j in 1..=sp {
            let lag = j * season;
            if !lags.contains(&lag) {
                lags.push(lag);
            }
        }
        lags.sort_unstable();

        let w = difference_ladder(y, d, sd, season)?;
        let max_lag = lags.last().copied().unwrap_or(0);
        let n_params = lags.len() + 1;
        if w.len() <= max_lag + n_params {
            return Err(PipelineError::data_format(format!(
                "insufficient data for statistical fit: {} differenced rows, need more than {}",
                w.len(),
                max_lag + n_params
            )));
        }

        // least squares on the differenced series
        let rows = w.len() - max_lag;
        let mut xtx = vec![vec![0.0; n_params]; n_params];
        let mut xty = vec![0.0; n_params];
        for t in max_lag..w.len() {
            let mut features = Vec::with_capacity(n_params);
            for lag in &lags {
                features.push(w[t - lag]);
            }
            features.push(1.0);
            for i in 0..n_params {
                for j in 0..n_params {
                    xtx[i][j] += features[i] * features[j];
                }
                xty[i] += features[i] * w[t];
            }
        }
        // small ridge keeps near-collinear systems solvable
        for (i, row) in xtx.iter_mut().enumerate() {
            row[i] += 1e-9;
        }
        let solution = solve(xtx, xty)?;
        let (coefficients, intercept) = (
            solution[..n_params - 1].to_vec(),
            solution[n_params - 1],
        );

        let tail_len = max_lag + d + sd * season;
        let tail = y[y.len() - tail_len.min(y.len())..].to_vec();

        info!(rows, lags = ?lags, "statistical model fitted");
        Ok(Self {
            order: cfg.order,
            seasonal_order: cfg.seasonal_order,
            coefficients,
            intercept,
            lags,
            tail,
            trained_at: Utc::now(),
        })
    }

    /// Recursive multi-step forecast starting right after the training
    /// series.
    pub fn forecast(&self, steps: usize) -> Result<Vec<f64>> {
        let [_, d, _] = self.order;
        let [_, sd, _, season] = self.seasonal_order;

        // ladder of series: raw, after each regular diff, after each
        // seasonal diff; the last level is the regression space
        let mut levels: Vec<Vec<f64>> = vec![self.tail.clone()];
        let mut diff_lags = Vec::new();
        for _ in 0..d {
            diff_lags.push(1);
        }
        for _ in 0..sd {
            diff_lags.push(season);
        }
        for lag in &diff_lags {
            let prev = levels.last().expect("ladder non-empty");
            if prev.len() < *lag {
                return Err(PipelineError::inference(
                    "history tail too short to difference",
                ));
            }
            let next: Vec<f64> = (*lag..prev.len())
                .map(|t| prev[t] - prev[t - lag])
                .collect();
            levels.push(next);
        }

        let mut out = Vec::with_capacity(steps);
        for _ in 0..steps {
            let w = levels.last().expect("ladder non-empty");
            let mut next = self.intercept;
            for (coef, lag) in self.coefficients.iter().zip(&self.lags) {
                if w.len() < *lag {
                    return Err(PipelineError::inference(
                        "history tail too short for configured lags",
                    ));
                }
                next += coef * w[w.len() - lag];
            }
            // integrate back up the ladder
            let deepest = levels.len() - 1;
            levels[deepest].push(next);
            for i in (1..=deepest).rev() {
                let lag = diff_lags[i - 1];
                let child = *levels[i].last().expect("just pushed");
                let parent = &levels[i - 1];
                if parent.len() < lag {
                    return Err(PipelineError::inference(
                        "history tail too short to integrate",
                    ));
                }
                let restored = child + parent[parent.len() - lag];
                levels[i - 1].push(restored);
            }
            out.push(*levels[0].last().expect("just pushed"));
        }
        Ok(out)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_vec_pretty(self)?)?;
        info!(path = %path.display(), "saved statistical model");
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)
            .map_err(|_| PipelineError::ArtifactMissing(path.to_path_buf()))?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

/// Apply `d` regular differences then `sd` seasonal differences.
fn difference_ladder(y: &[f64], d: usize, sd: usize, season: usize) -> Result<Vec<f64>> {
    let mut current = y.to_vec();
    for _ in 0..d {
        if current.len() <= 1 {
            return Err(PipelineError::data_format("series too short to difference"));
        }
        current = (1..current.len())
            .map(|t| current[t] - current[t - 1])
            .collect();
    }
    for _ in 0..sd {
        if current.len() <= season {
            return Err(PipelineError::data_format(
                "series too short to difference seasonally",
            ));
        }
        current = (season..current.len())
            .map(|t| current[t] - current[t - season])
            .collect();
    }
    Ok(current)
}

/// Gaussian elimination with partial pivoting.
fn solve(mut a: Vec<Vec<f64>>, mut b: Vec<f64>) -> Result<Vec<f64>> {
    let n = b.len();
    for col in 0..n {
        let pivot = (col..n)
            .max_by(|&i, &j| a[i][col].abs().total_cmp(&a[j][col].abs()))
            .expect("non-empty range");
        if a[pivot][col].abs() < 1e-12 {
            return Err(PipelineError::inference("singular system in least squares"));
        }
        a.swap(col, pivot);
        b.swap(col, pivot);
        for row in col + 1..n {
            let factor = a[row][col] / a[col][col];
            for k in col..n {
                a[row][k] -= factor * a[col][k];
            }
            b[row] -= factor * b[col];
        }
    }
    let mut x = vec![0.0; n];
    for row in (0..n).rev() {
        let mut sum = b[row];
        for col in row + 1..n {
            sum -= a[row][col] * x[col];
        }
        x[row] = sum / a[row][row];
    }
    Ok(x)
}
