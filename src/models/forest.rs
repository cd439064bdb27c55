//! Tree-ensemble regressor wrapping smartcore's random forest.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use smartcore::ensemble::random_forest_regressor::{
    RandomForestRegressor, RandomForestRegressorParameters,
};
use smartcore::linalg::basic::matrix::DenseMatrix;
use tracing::info;

use crate::config::ForestConfig;
use crate::error::{PipelineError, Result};

#[derive(Debug, Serialize, Deserialize)]
pub struct ForestModel {
    pub feature_names: Vec<String>,
    /// Per-column fill values (training means, in the model's input space)
    /// used when the serving layer reconstructs a feature vector from
    /// recent history alone.
    pub fill_values: Vec<f64>,
    pub n_trees: usize,
    pub max_depth: Option<u16>,
    pub min_samples_split: usize,
    pub trained_at: DateTime<Utc>,
    model: RandomForestRegressor<f64, f64, DenseMatrix<f64>, Vec<f64>>,
}

impl ForestModel {
    /// Train on a row-major regressor matrix. Malformed input propagates;
    /// this family is not skipped on error.
    pub fn train(
        x: &[Vec<f64>],
        y: &[f64],
        cfg: &ForestConfig,
        feature_names: Vec<String>,
    ) -> Result<Self> {
        if x.is_empty() || y.is_empty() {
            return Err(PipelineError::data_format("cannot train on empty dataset"));
        }
        if x.len() != y.len() {
            return Err(PipelineError::data_format(format!(
                "feature and target count mismatch: {} rows, {} targets",
                x.len(),
                y.len()
            )));
        }
        let n_samples = x.len();
        let n_features = x[0].len();
        let mut flat = Vec::with_capacity(n_samples * n_features);
        for row in x {
            if row.len() != n_features {
                return Err(PipelineError::data_format(
                    "all feature rows must have the same length",
                ));
            }
            flat.extend_from_slice(row);
        }

        let params = RandomForestRegressorParameters {
            max_depth: cfg.max_depth,
            min_samples_leaf: 2,
            min_samples_split: cfg.min_samples_split,
            n_trees: cfg.n_trees,
            m: None,
            keep_samples: false,
            seed: 42,
        };

        let x_matrix = DenseMatrix::new(n_samples, n_features, flat, false);
        let model = RandomForestRegressor::fit(&x_matrix, &y.to_vec(), params)
            .map_err(|e| PipelineError::inference(format!("forest training failed: {e:?}")))?;

        let mut fill_values = vec![0.0; n_features];
        for row in x {
            for (f, v) in fill_values.iter_mut().zip(row) {
                *f += v;
            }
        }
        for f in &mut fill_values {
            *f /= n_samples as f64;
        }

        info!(n_samples, n_features, trees = cfg.n_trees, "forest trained");
        Ok(Self {
            feature_names,
            fill_values,
            n_trees: cfg.n_trees,
            max_depth: cfg.max_depth,
            min_samples_split: cfg.min_samples_split,
            trained_at: Utc::now(),
            model,
        })
    }

    pub fn predict_rows(&self, x: &[Vec<f64>]) -> Result<Vec<f64>> {
        if x.is_empty() {
            return Ok(Vec::new());
        }
        let n_features = self.feature_names.len();
        let mut flat = Vec::with_capacity(x.len() * n_features);
        for row in x {
            if row.len() != n_features {
                return Err(PipelineError::inference(format!(
                    "feature count mismatch: expected {n_features}, got {}",
                    row.len()
                )));
            }
            flat.extend_from_slice(row);
        }
        let matrix = DenseMatrix::new(x.len(), n_features, flat, false);
        self.model
            .predict(&matrix)
            .map_err(|e| PipelineError::inference(format!("forest prediction failed: {e:?}")))
    }

    pub fn predict_one(&self, features: &[f64]) -> Result<f64> {
        let preds = self.predict_rows(&[features.to_vec()])?;
        preds
            .first()
            .copied()
            .ok_or_else(|| PipelineError::inference("forest returned no prediction"))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let bytes = bincode::serialize(self)
            .map_err(|e| PipelineError::inference(format!("serialize forest: {e}")))?;
        std::fs::write(path, bytes)?;
        info!(path = %path.display(), "saved forest model");
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)
            .map_err(|_| PipelineError::ArtifactMissing(path.to_path_buf()))?;
        bincode::deserialize(&bytes)
            .map_err(|e| PipelineError::inference(format!("deserialize forest: {e}")))
    }
}
