use axum::{extract::State, Json};
use serde::Serialize;

use super::{error::ApiError, ApiContext};

#[derive(Debug, Serialize)]
pub struct ModelsResponse {
    models: Vec<String>,
}

/// GET /models: list model artifact filenames present on disk. An absent
/// models directory is an empty listing, not an error.
pub async fn list_models(
    State(ctx): State<ApiContext>,
) -> Result<Json<ModelsResponse>, ApiError> {
    let dir = &ctx.cfg.paths.models_dir;
    let mut models = Vec::new();
    if dir.is_dir() {
        let entries = std::fs::read_dir(dir)
            .map_err(|e| ApiError::InternalError(format!("cannot read models dir: {e}")))?;
        for entry in entries {
            let entry =
                entry.map_err(|e| ApiError::InternalError(format!("cannot read entry: {e}")))?;
            if entry.path().is_file() {
                models.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        models.sort();
    }
    Ok(Json(ModelsResponse { models }))
}
