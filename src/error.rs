use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by the offline pipeline stages and the model layer.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Missing or malformed configuration, including declared columns that
    /// do not exist and sampling frequencies that do not divide a day.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Raw or uploaded data that cannot be interpreted as a time series.
    #[error("data format error: {0}")]
    DataFormat(String),

    /// A persisted artifact (model file, metrics summary) is absent on disk.
    #[error("artifact missing: {}", .0.display())]
    ArtifactMissing(PathBuf),

    /// A model fit or predict call failed.
    #[error("model inference error: {0}")]
    ModelInference(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, PipelineError>;

impl PipelineError {
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    pub fn data_format(msg: impl Into<String>) -> Self {
        Self::DataFormat(msg.into())
    }

    pub fn inference(msg: impl Into<String>) -> Self {
        Self::ModelInference(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_context() {
        let err = PipelineError::configuration("target column 'consumption' not found");
        assert_eq!(
            err.to_string(),
            "configuration error: target column 'consumption' not found"
        );

        let err = PipelineError::ArtifactMissing(PathBuf::from("models/forest.bin"));
        assert!(err.to_string().contains("models/forest.bin"));
    }
}
