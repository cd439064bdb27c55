//! Forecast accuracy metrics.
//!
//! Pure functions over aligned true/predicted arrays; the resulting
//! three-key summary is the single source of truth read by both the
//! evaluation stage and the serving layer.

use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};

/// Floor for MAPE denominators so exact zeros do not divide by zero.
const MAPE_EPSILON: f64 = 1e-8;

/// Fixed three-key accuracy summary for one model family.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EvalMetrics {
    pub rmse: f64,
    pub mae: f64,
    pub mape: f64,
}

/// Compute RMSE, MAE and MAPE (percent, denominator clamped to a small
/// positive epsilon) over aligned arrays of equal length.
pub fn evaluate(y_true: &[f64], y_pred: &[f64]) -> Result<EvalMetrics> {
    if y_true.len() != y_pred.len() {
        return Err(PipelineError::inference(format!(
            "length mismatch: {} true vs {} predicted",
            y_true.len(),
            y_pred.len()
        )));
    }
    if y_true.is_empty() {
        return Err(PipelineError::inference("empty arrays"));
    }

    let n = y_true.len() as f64;
    let mut sq_sum = 0.0;
    let mut abs_sum = 0.0;
    let mut pct_sum = 0.0;
    for (t, p) in y_true.iter().zip(y_pred) {
        let err = t - p;
        sq_sum += err * err;
        abs_sum += err.abs();
        pct_sum += (err / t.max(MAPE_EPSILON)).abs();
    }

    Ok(EvalMetrics {
        rmse: (sq_sum / n).sqrt(),
        mae: abs_sum / n,
        mape: pct_sum / n * 100.0,
    })
}

/// One-step naive errors over a single series: each value predicted by its
/// predecessor. Returns `(mae, rmse)`, both zero for a series of length
/// one or less.
pub fn one_step_naive_errors(values: &[f64]) -> (f64, f64) {
    if values.len() < 2 {
        return (0.0, 0.0);
    }
    let n = (values.len() - 1) as f64;
    let mut abs_sum = 0.0;
    let mut sq_sum = 0.0;
    for w in values.windows(2) {
        let err = w[1] - w[0];
        abs_sum += err.abs();
        sq_sum += err * err;
    }
    (abs_sum / n, (sq_sum / n).sqrt())
}
