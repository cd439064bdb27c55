//! Model families and their artifacts.
//!
//! Each trainer is an adapter over already-split train/test data: the tree
//! ensemble delegates to smartcore, the statistical and sequence families
//! are fitted in-crate over plain vectors. Artifacts are loaded from disk
//! per serving request, never cached.

pub mod forest;
pub mod persistence;
pub mod recurrent;
pub mod sarima;

pub use forest::ForestModel;
pub use recurrent::RecurrentModel;
pub use sarima::SarimaModel;

use strum_macros::{Display, EnumString};

use crate::features::lags::parse_lag_name;
use crate::features::Scaler;

/// Model family selector used by config, artifacts and the predict API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ModelKind {
    Persistence,
    Sarima,
    Forest,
    Recurrent,
}

impl ModelKind {
    /// Artifact filename under the models directory; persistence has none.
    pub fn artifact_filename(&self) -> Option<&'static str> {
        match self {
            Self::Persistence => None,
            Self::Sarima => Some("sarima.json"),
            Self::Forest => Some("forest.bin"),
            Self::Recurrent => Some("recurrent.json"),
        }
    }
}

/// Build one regressor vector for ad-hoc serving input.
///
/// Lag columns are taken from the recent-history array (most recent last,
/// histories shorter than a lag fall back to the oldest value); every other
/// column keeps its training fill value. Lag values pass through the scaler
/// when one was fitted.
pub fn fill_feature_vector(
    feature_names: &[String],
    fill_values: &[f64],
    recent: &[f64],
    scaler: Option<&Scaler>,
) -> Vec<f64> {
    feature_names
        .iter()
        .enumerate()
        .map(|(col, name)| match parse_lag_name(name) {
            Some(k) => {
                let raw = if recent.len() >= k {
                    recent[recent.len() - k]
                } else {
                    recent[0]
                };
                match scaler {
                    Some(s) => s.transform_value(col, raw),
                    None => raw,
                }
            }
            None => fill_values[col],
        })
        .collect()
}

/// Build a lookback window of regressor vectors from recent history, for
/// the sequence model. Row `r` represents the step `lookback - r` before
/// the forecast target, so lag columns shift accordingly.
pub fn fill_feature_window(
    feature_names: &[String],
    fill_values: &[f64],
    recent: &[f64],
    lookback: usize,
    scaler: Option<&Scaler>,
) -> Vec<Vec<f64>> {
    let m = recent.len() as isize;
    (0..lookback)
        .map(|r| {
            feature_names
                .iter()
                .enumerate()
                .map(|(col, name)| match parse_lag_name(name) {
                    Some(k) => {
                        let idx = m - lookback as isize + r as isize - k as isize;
                        let raw = if idx >= 0 {
                            recent[idx as usize]
                        } else {
                            recent[0]
                        };
                        match scaler {
                            Some(s) => s.transform_value(col, raw),
                            None => raw,
                        }
                    }
                    None => fill_values[col],
                })
                .collect()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn model_kind_parses_case_insensitively() {
        assert_eq!(ModelKind::from_str("persistence").unwrap(), ModelKind::Persistence);
        assert_eq!(ModelKind::from_str("Forest").unwrap(), ModelKind::Forest);
        assert!(ModelKind::from_str("lightgbm").is_err());
    }

    #[test]
    fn artifact_names() {
        assert_eq!(ModelKind::Persistence.artifact_filename(), None);
        assert_eq!(ModelKind::Forest.artifact_filename(), Some("forest.bin"));
    }

    #[test]
    fn fill_vector_uses_history_for_lags() {
        let names = vec!["hour".to_string(), "lag_1".to_string(), "lag_3".to_string()];
        let fills = vec![12.0, 0.0, 0.0];
        let recent = vec![10.0, 20.0];
        let v = fill_feature_vector(&names, &fills, &recent, None);
        // hour keeps its fill value, lag_1 = last, lag_3 falls back to oldest
        assert_eq!(v, vec![12.0, 20.0, 10.0]);
    }

    #[test]
    fn fill_window_shifts_lags_per_row() {
        let names = vec!["lag_1".to_string()];
        let fills = vec![0.0];
        let recent = vec![1.0, 2.0, 3.0, 4.0];
        let window = fill_feature_window(&names, &fills, &recent, 3, None);
        // rows represent t-3, t-2, t-1; lag_1 at each is the prior value
        assert_eq!(window, vec![vec![2.0], vec![3.0], vec![4.0]]);
    }
}
