//! Naive persistence baseline: forecast equals the most recent observation.

/// One-step-behind predictions over the test series, head backfilled from
/// the first actual. Mirrors a shift-then-backfill over the same series, so
/// it never fails and needs no artifact.
pub fn one_step_naive(actuals: &[f64]) -> Vec<f64> {
    if actuals.is_empty() {
        return Vec::new();
    }
    let mut preds = Vec::with_capacity(actuals.len());
    preds.push(actuals[0]);
    preds.extend_from_slice(&actuals[..actuals.len() - 1]);
    preds
}

/// Flat-line forecast: repeat the last observed value `steps` times.
pub fn flat_forecast(last: f64, steps: usize) -> Vec<f64> {
    vec![last; steps]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shifts_by_one_with_backfilled_head() {
        assert_eq!(one_step_naive(&[3.0, 5.0, 4.0]), vec![3.0, 3.0, 5.0]);
    }

    #[test]
    fn empty_input_gives_empty_output() {
        assert!(one_step_naive(&[]).is_empty());
    }

    #[test]
    fn flat_forecast_repeats_last() {
        assert_eq!(flat_forecast(11.0, 3), vec![11.0, 11.0, 11.0]);
    }
}
