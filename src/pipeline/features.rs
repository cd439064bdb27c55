use std::path::PathBuf;

use tracing::info;

use crate::config::Config;
use crate::data::CleanSeries;
use crate::error::Result;
use crate::features::build_features;

/// Build and persist the feature frame (and the fitted scaler, if any)
/// from the cleaned series.
pub fn run_features(cfg: &Config) -> Result<PathBuf> {
    let clean = CleanSeries::read_csv(&cfg.paths.clean_data_file())?;
    let (frame, scaler) = build_features(&clean, &cfg.training)?;

    if let Some(scaler) = &scaler {
        scaler.save(&cfg.paths.scaler_file())?;
    }
    frame.write_csv(&cfg.paths.features_file)?;
    info!(
        rows = frame.len(),
        out = %cfg.paths.features_file.display(),
        "feature stage complete"
    );
    Ok(cfg.paths.features_file.clone())
}
