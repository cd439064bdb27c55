use std::path::PathBuf;

use tracing::info;

use crate::config::Config;
use crate::data::{parse_freq, read_and_concat, resample_and_clean};
use crate::error::Result;

/// Ingest raw meter CSVs: concatenate, resample, clean, persist.
pub fn run_ingest(cfg: &Config) -> Result<PathBuf> {
    let raw = read_and_concat(&cfg.paths.raw_dir, &cfg.data)?;
    let freq = parse_freq(&cfg.data.resample_freq)?;
    let clean = resample_and_clean(
        &raw,
        freq,
        cfg.data.fillna_method,
        cfg.data.threshold_on,
    )?;

    let out = cfg.paths.clean_data_file();
    clean.write_csv(&out)?;
    info!(rows = clean.len(), out = %out.display(), "ingest stage complete");
    Ok(out)
}
