use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::ScaleMethod;
use crate::error::{PipelineError, Result};

/// Fitted per-column scaler for the regressor matrix, persisted as JSON so
/// the serving layer can scale ad-hoc feature vectors consistently.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "method", rename_all = "lowercase")]
pub enum Scaler {
    Standard { means: Vec<f64>, stds: Vec<f64> },
    Minmax { mins: Vec<f64>, maxs: Vec<f64> },
}

impl Scaler {
    /// Fit on a row-major matrix. Returns `None` for `ScaleMethod::None`.
    pub fn fit(method: ScaleMethod, rows: &[Vec<f64>]) -> Option<Self> {
        if rows.is_empty() {
            return None;
        }
        let n_cols = rows[0].len();
        match method {
            ScaleMethod::None => None,
            ScaleMethod::Standard => {
                let mut means = vec![0.0; n_cols];
                for row in rows {
                    for (m, v) in means.iter_mut().zip(row) {
                        *m += v;
                    }
                }
                for m in &mut means {
                    *m /= rows.len() as f64;
                }
                let mut stds = vec![0.0; n_cols];
                for row in rows {
                    for ((s, v), m) in stds.iter_mut().zip(row).zip(&means) {
                        *s += (v - m).powi(2);
                    }
                }
                for s in &mut stds {
                    *s = (*s / rows.len() as f64).sqrt();
                }
                Some(Self::Standard { means, stds })
            }
            ScaleMethod::Minmax => {
                let mut mins = vec![f64::INFINITY; n_cols];
                let mut maxs = vec![f64::NEG_INFINITY; n_cols];
                for row in rows {
                    for ((lo, hi), v) in mins.iter_mut().zip(&mut maxs).zip(row) {
                        *lo = lo.min(*v);
                        *hi = hi.max(*v);
                    }
                }
                Some(Self::Minmax { mins, maxs })
            }
        }
    }

    /// Scale a single value belonging to column `col`.
    pub fn transform_value(&self, col: usize, v: f64) -> f64 {
        match self {
            Self::Standard { means, stds } => {
                if stds[col].abs() < 1e-10 {
                    0.0
                } else {
                    (v - means[col]) / stds[col]
                }
            }
            Self::Minmax { mins, maxs } => {
                let range = maxs[col] - mins[col];
                if range.abs() < 1e-10 {
                    0.5
                } else {
                    (v - mins[col]) / range
                }
            }
        }
    }

    pub fn transform_rows(&self, rows: &mut [Vec<f64>]) {
        for row in rows {
            for (col, v) in row.iter_mut().enumerate() {
                *v = self.transform_value(col, *v);
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_vec_pretty(self)?)?;
        info!(path = %path.display(), "saved scaler");
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)
            .map_err(|_| PipelineError::ArtifactMissing(path.to_path_buf()))?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Absent file means the pipeline ran with `scale_method: none`.
    pub fn load_optional(path: &Path) -> Result<Option<Self>> {
        if path.exists() {
            Ok(Some(Self::load(path)?))
        } else {
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows() -> Vec<Vec<f64>> {
        vec![vec![0.0, 10.0], vec![2.0, 20.0], vec![4.0, 30.0]]
    }

    #[test]
    fn standard_scaling_centers_columns() {
        let scaler = Scaler::fit(ScaleMethod::Standard, &rows()).unwrap();
        let mut data = rows();
        scaler.transform_rows(&mut data);
        for col in 0..2 {
            let mean: f64 = data.iter().map(|r| r[col]).sum::<f64>() / data.len() as f64;
            assert!(mean.abs() < 1e-9);
        }
    }

    #[test]
    fn minmax_maps_to_unit_interval() {
        let scaler = Scaler::fit(ScaleMethod::Minmax, &rows()).unwrap();
        let mut data = rows();
        scaler.transform_rows(&mut data);
        assert_eq!(data[0], vec![0.0, 0.0]);
        assert_eq!(data[2], vec![1.0, 1.0]);
    }

    #[test]
    fn degenerate_column_does_not_blow_up() {
        let flat = vec![vec![5.0], vec![5.0]];
        let scaler = Scaler::fit(ScaleMethod::Standard, &flat).unwrap();
        assert_eq!(scaler.transform_value(0, 5.0), 0.0);

        let scaler = Scaler::fit(ScaleMethod::Minmax, &flat).unwrap();
        assert_eq!(scaler.transform_value(0, 5.0), 0.5);
    }

    #[test]
    fn none_method_fits_nothing() {
        assert!(Scaler::fit(ScaleMethod::None, &rows()).is_none());
    }

    #[test]
    fn save_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scaler.json");
        let scaler = Scaler::fit(ScaleMethod::Standard, &rows()).unwrap();
        scaler.save(&path).unwrap();
        assert_eq!(Scaler::load(&path).unwrap(), scaler);
        assert!(Scaler::load_optional(&dir.path().join("missing.json"))
            .unwrap()
            .is_none());
    }
}
