//! File-based experiment tracking.
//!
//! Runs are recorded as JSON files under the configured tracking directory
//! (an MLflow-style `file:` URI), one file per model run, tagged with the
//! target variable plus `ENV`/`USER` environment labels.

use std::path::{Path, PathBuf};

use chrono::Utc;
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use crate::config::Config;
use crate::error::Result;
use crate::metrics::EvalMetrics;

pub struct ExperimentTracker {
    experiment_dir: PathBuf,
    target: String,
}

impl ExperimentTracker {
    /// Resolve the tracking directory, create the experiment folder and
    /// write its descriptor.
    pub fn init(cfg: &Config) -> Result<Self> {
        let root = tracking_dir(&cfg.tracking.tracking_uri);
        let experiment_dir = root.join(&cfg.tracking.experiment_name);
        std::fs::create_dir_all(&experiment_dir)?;

        let descriptor = json!({
            "experiment": cfg.tracking.experiment_name,
            "description": cfg.tracking.experiment_description,
            "target": cfg.training.target_col,
            "environment": env_tag(),
            "created_at": Utc::now().to_rfc3339(),
        });
        std::fs::write(
            experiment_dir.join("experiment.json"),
            serde_json::to_vec_pretty(&descriptor)?,
        )?;

        info!(dir = %experiment_dir.display(), "experiment tracking initialized");
        Ok(Self {
            experiment_dir,
            target: cfg.training.target_col.clone(),
        })
    }

    /// Record one model run: tags, params and final metrics.
    pub fn log_run(
        &self,
        model: &str,
        description: &str,
        params: serde_json::Value,
        metrics: &EvalMetrics,
    ) -> Result<PathBuf> {
        let run_id = Uuid::new_v4();
        let record = json!({
            "run_id": run_id,
            "run_name": model,
            "tags": {
                "model": model,
                "description": description,
                "target": self.target,
                "run.env": env_tag(),
                "run.author": author_tag(),
            },
            "params": params,
            "metrics": metrics,
            "logged_at": Utc::now().to_rfc3339(),
        });
        let path = self
            .experiment_dir
            .join(format!("run-{model}-{run_id}.json"));
        std::fs::write(&path, serde_json::to_vec_pretty(&record)?)?;
        info!(model, %run_id, "run logged");
        Ok(path)
    }
}

/// Strip an optional `file:` prefix from the tracking URI.
fn tracking_dir(uri: &str) -> PathBuf {
    let path = uri.strip_prefix("file:").unwrap_or(uri);
    Path::new(path).to_path_buf()
}

fn env_tag() -> String {
    std::env::var("ENV").unwrap_or_else(|_| "dev".to_string())
}

fn author_tag() -> String {
    std::env::var("USER").unwrap_or_else(|_| "unknown".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_file_prefix() {
        assert_eq!(tracking_dir("file:./mlruns"), PathBuf::from("./mlruns"));
        assert_eq!(tracking_dir("/abs/mlruns"), PathBuf::from("/abs/mlruns"));
    }

    #[test]
    fn logs_a_run_record() {
        let dir = tempfile::tempdir().unwrap();
        let tracker = ExperimentTracker {
            experiment_dir: dir.path().to_path_buf(),
            target: "consumption".into(),
        };
        let metrics = EvalMetrics {
            rmse: 1.0,
            mae: 0.5,
            mape: 10.0,
        };
        let path = tracker
            .log_run("persistence", "baseline", json!({}), &metrics)
            .unwrap();
        let record: serde_json::Value =
            serde_json::from_slice(&std::fs::read(path).unwrap()).unwrap();
        assert_eq!(record["tags"]["model"], "persistence");
        assert_eq!(record["tags"]["target"], "consumption");
        assert_eq!(record["metrics"]["mae"], 0.5);
    }
}
