use axum::{extract::State, Json};

use crate::error::PipelineError;

use super::{error::ApiError, ApiContext};

/// GET /metrics/summary: return the persisted metrics summary, re-read
/// from disk per request. 404 before any training run completes.
pub async fn metrics_summary(
    State(ctx): State<ApiContext>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let path = ctx.cfg.paths.metrics_summary_file();
    let bytes =
        std::fs::read(&path).map_err(|_| PipelineError::ArtifactMissing(path.clone()))?;
    let summary: serde_json::Value =
        serde_json::from_slice(&bytes).map_err(PipelineError::from)?;
    Ok(Json(summary))
}
