//! Lag and rolling-window features over the consumption column.
//!
//! Both feature kinds reference strictly earlier rows only: lags shift by
//! `k`, rolling means use a minimum window of one observation and are then
//! shifted forward one step so row `t` never incorporates row `t`.

/// `lag_{k}` column: value `k` steps in the past, `None` for the first `k`
/// rows.
pub fn lag_column(values: &[f64], k: usize) -> Vec<Option<f64>> {
    (0..values.len())
        .map(|t| if t >= k { Some(values[t - k]) } else { None })
        .collect()
}

/// `roll_mean_{w}` column: mean of the up-to-`w` observations preceding row
/// `t` (min window 1, shifted by one step). Row 0 has no preceding
/// observation and is `None`.
pub fn shifted_rolling_mean(values: &[f64], w: usize) -> Vec<Option<f64>> {
    assert!(w > 0, "rolling window must be positive");
    (0..values.len())
        .map(|t| {
            if t == 0 {
                None
            } else {
                let start = t.saturating_sub(w);
                let window = &values[start..t];
                Some(window.iter().sum::<f64>() / window.len() as f64)
            }
        })
        .collect()
}

/// Column name helpers, kept in one place so the serving layer can
/// recognize lag columns by name.
pub fn lag_name(k: usize) -> String {
    format!("lag_{k}")
}

pub fn roll_name(w: usize) -> String {
    format!("roll_mean_{w}")
}

/// Parse `lag_{k}` back into `k`; used when reconstructing a feature vector
/// from recent history at serve time.
pub fn parse_lag_name(name: &str) -> Option<usize> {
    name.strip_prefix("lag_").and_then(|k| k.parse().ok())
}
