use std::str::FromStr;

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::features::Scaler;
use crate::models::{
    fill_feature_vector, fill_feature_window, ForestModel, ModelKind, RecurrentModel, SarimaModel,
};

use super::{error::ApiError, ApiContext};

#[derive(Debug, Deserialize)]
pub struct PredictRequest {
    /// Recent consumption values, most recent last.
    pub recent_history: Vec<f64>,
    #[serde(default = "default_model")]
    pub model: String,
}

fn default_model() -> String {
    "forest".to_string()
}

#[derive(Debug, Serialize)]
pub struct PredictResponse {
    pub predictions: Vec<f64>,
    /// Input tail echoed back by the sequence model path.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sequence: Option<Vec<f64>>,
    pub model: String,
}

/// POST /predict: single-step prediction from recent history, dispatched
/// by model family. Each path loads its serialized artifact from disk per
/// request; there is no cache.
pub async fn predict(
    State(ctx): State<ApiContext>,
    Json(req): Json<PredictRequest>,
) -> Result<Json<PredictResponse>, ApiError> {
    let Some(&last) = req.recent_history.last() else {
        return Err(ApiError::BadRequest("recent_history is empty".to_string()));
    };
    let kind = ModelKind::from_str(&req.model)
        .map_err(|_| ApiError::BadRequest(format!("unsupported model '{}'", req.model)))?;

    let models_dir = &ctx.cfg.paths.models_dir;
    let mut sequence = None;
    let predictions = match kind {
        ModelKind::Persistence => vec![last],
        ModelKind::Forest => {
            let model = ForestModel::load(&models_dir.join("forest.bin"))?;
            let scaler = Scaler::load_optional(&ctx.cfg.paths.scaler_file())?;
            let features = fill_feature_vector(
                &model.feature_names,
                &model.fill_values,
                &req.recent_history,
                scaler.as_ref(),
            );
            vec![model.predict_one(&features)?]
        }
        ModelKind::Recurrent => {
            let model = RecurrentModel::load(&models_dir.join("recurrent.json"))?;
            let scaler = Scaler::load_optional(&ctx.cfg.paths.scaler_file())?;
            let window = fill_feature_window(
                &model.feature_names,
                &model.fill_values,
                &req.recent_history,
                model.lookback,
                scaler.as_ref(),
            );
            let tail_start = req.recent_history.len().saturating_sub(model.lookback);
            sequence = Some(req.recent_history[tail_start..].to_vec());
            vec![model.predict_window(&window)?]
        }
        ModelKind::Sarima => {
            let model = SarimaModel::load(&models_dir.join("sarima.json"))?;
            model.forecast(1)?
        }
    };

    Ok(Json(PredictResponse {
        predictions,
        sequence,
        model: kind.to_string(),
    }))
}
