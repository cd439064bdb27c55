use std::collections::BTreeMap;
use std::path::PathBuf;

use tracing::info;

use crate::config::Config;
use crate::error::{PipelineError, Result};
use crate::metrics::EvalMetrics;

/// Read the persisted metrics summary, log the per-model comparison and
/// render it as CSV next to the JSON.
pub fn run_evaluate(cfg: &Config) -> Result<PathBuf> {
    let summary_path = cfg.paths.metrics_summary_file();
    let bytes = std::fs::read(&summary_path)
        .map_err(|_| PipelineError::ArtifactMissing(summary_path.clone()))?;
    let summary: BTreeMap<String, EvalMetrics> = serde_json::from_slice(&bytes)?;

    for (model, m) in &summary {
        info!(
            model,
            rmse = m.rmse,
            mae = m.mae,
            mape = m.mape,
            "model comparison"
        );
    }

    let csv_path = cfg.paths.metrics_summary_csv();
    let mut writer = csv::Writer::from_path(&csv_path)?;
    writer.write_record(["model", "rmse", "mae", "mape"])?;
    for (model, m) in &summary {
        writer.write_record([
            model.clone(),
            format!("{}", m.rmse),
            format!("{}", m.mae),
            format!("{}", m.mape),
        ])?;
    }
    writer.flush()?;
    info!(path = %csv_path.display(), "saved metrics CSV");
    Ok(csv_path)
}
