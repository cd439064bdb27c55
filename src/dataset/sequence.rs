//! Sliding-window sequence construction for the recurrent model family.

/// Supervised windows over a feature matrix: input `i` is rows
/// `[i, i + lookback)`, label `i` is the target at row `i + lookback`.
///
/// Exactly `len - lookback` windows are produced (none when the matrix is
/// too short); ordering is preserved.
pub fn create_sequences(
    x: &[Vec<f64>],
    y: &[f64],
    lookback: usize,
) -> (Vec<Vec<Vec<f64>>>, Vec<f64>) {
    assert_eq!(x.len(), y.len(), "feature/target length mismatch");
    if lookback == 0 || x.len() <= lookback {
        return (Vec::new(), Vec::new());
    }
    let mut windows = Vec::with_capacity(x.len() - lookback);
    let mut labels = Vec::with_capacity(x.len() - lookback);
    for i in lookback..x.len() {
        windows.push(x[i - lookback..i].to_vec());
        labels.push(y[i]);
    }
    (windows, labels)
}

/// Window the concatenated train+test matrices and assign the last
/// `y_test.len()` windows to the test set.
///
/// Test windows may look back into the train tail (context at the split
/// boundary is kept rather than discarded), but a window's input always
/// ends strictly before its label's row.
pub fn boundary_sequences(
    x_train: &[Vec<f64>],
    y_train: &[f64],
    x_test: &[Vec<f64>],
    y_test: &[f64],
    lookback: usize,
) -> SequenceSplit {
    let mut combined_x = x_train.to_vec();
    combined_x.extend_from_slice(x_test);
    let mut combined_y = y_train.to_vec();
    combined_y.extend_from_slice(y_test);

    let (windows, labels) = create_sequences(&combined_x, &combined_y, lookback);
    let n_test = y_test.len().min(windows.len());
    let cut = windows.len() - n_test;

    SequenceSplit {
        train_windows: windows[..cut].to_vec(),
        train_labels: labels[..cut].to_vec(),
        test_windows: windows[cut..].to_vec(),
        test_labels: labels[cut..].to_vec(),
    }
}

#[derive(Debug, Clone)]
pub struct SequenceSplit {
    pub train_windows: Vec<Vec<Vec<f64>>>,
    pub train_labels: Vec<f64>,
    pub test_windows: Vec<Vec<Vec<f64>>>,
    pub test_labels: Vec<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn matrix(n: usize) -> (Vec<Vec<f64>>, Vec<f64>) {
        let x: Vec<Vec<f64>> = (0..n).map(|i| vec![i as f64, 2.0 * i as f64]).collect();
        let y: Vec<f64> = (0..n).map(|i| 100.0 + i as f64).collect();
        (x, y)
    }

    #[test]
    fn produces_len_minus_lookback_windows() {
        let (x, y) = matrix(10);
        let (windows, labels) = create_sequences(&x, &y, 3);
        assert_eq!(windows.len(), 7);
        assert_eq!(labels.len(), 7);
        // window 0 covers rows 0..3, label is row 3
        assert_eq!(windows[0][0][0], 0.0);
        assert_eq!(windows[0][2][0], 2.0);
        assert_eq!(labels[0], 103.0);
    }

    #[test]
    fn short_matrix_yields_nothing() {
        let (x, y) = matrix(3);
        let (windows, labels) = create_sequences(&x, &y, 3);
        assert!(windows.is_empty());
        assert!(labels.is_empty());
    }

    #[test]
    fn boundary_split_keeps_cross_boundary_context() {
        let (x, y) = matrix(20);
        let (x_train, x_test) = (x[..15].to_vec(), x[15..].to_vec());
        let (y_train, y_test) = (y[..15].to_vec(), y[15..].to_vec());

        let split = boundary_sequences(&x_train, &y_train, &x_test, &y_test, 4);
        assert_eq!(split.test_labels.len(), 5);
        assert_eq!(split.train_labels.len(), 20 - 4 - 5);
        // test labels are exactly the test targets, in order
        assert_eq!(split.test_labels, y_test);
        // the first test window reaches back into train rows (rows 11..15)
        assert_eq!(split.test_windows[0][0][0], 11.0);
    }

    proptest! {
        /// Window i's input rows all precede its label row; labels map to
        /// original row i + lookback.
        #[test]
        fn windows_never_look_forward(n in 2usize..120, lookback in 1usize..20) {
            let (x, y) = matrix(n);
            let (windows, labels) = create_sequences(&x, &y, lookback);
            let expected = n.saturating_sub(lookback);
            prop_assert_eq!(windows.len(), if lookback == 0 { 0 } else { expected });
            for (i, (w, label)) in windows.iter().zip(&labels).enumerate() {
                prop_assert_eq!(*label, 100.0 + (i + lookback) as f64);
                // last input row is the label's immediate predecessor
                prop_assert_eq!(w.last().unwrap()[0], (i + lookback - 1) as f64);
            }
        }
    }
}
