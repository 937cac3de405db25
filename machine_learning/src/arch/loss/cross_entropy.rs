use ndarray::{Array2, ArrayView2, Axis, Zip};

use super::LossFn;

/// Computes the softmax of every row of `logits`, shifted by the row maximum.
pub fn softmax(logits: ArrayView2<f32>) -> Array2<f32> {
    let mut probs = logits.to_owned();

    for mut row in probs.axis_iter_mut(Axis(0)) {
        let max = row.fold(f32::NEG_INFINITY, |m, &z| m.max(z));
        row.mapv_inplace(|z| (z - max).exp());
        let sum = row.sum();
        row.mapv_inplace(|e| e / sum);
    }

    probs
}

/// Softmax cross-entropy over raw logits, averaged over rows.
///
/// `y` holds one probability distribution per row, usually one-hot class labels. The derivative
/// with respect to the logits is `(softmax(logits) - y) / rows`.
#[derive(Default, Clone, Copy)]
pub struct SoftmaxCrossEntropy;

impl SoftmaxCrossEntropy {
    /// Returns a new `SoftmaxCrossEntropy`.
    pub fn new() -> Self {
        Self
    }
}

impl LossFn for SoftmaxCrossEntropy {
    fn loss(&self, y_pred: ArrayView2<f32>, y: ArrayView2<f32>) -> f32 {
        let rows = y_pred.nrows();
        if rows == 0 {
            return 0.0;
        }

        let mut total = 0.0;

        for (logits, labels) in y_pred.axis_iter(Axis(0)).zip(y.axis_iter(Axis(0))) {
            let max = logits.fold(f32::NEG_INFINITY, |m, &z| m.max(z));
            let log_sum = logits.mapv(|z| (z - max).exp()).sum().ln();

            Zip::from(&logits).and(&labels).for_each(|&z, &p| {
                total -= p * (z - max - log_sum);
            });
        }

        total / rows as f32
    }

    fn loss_prime(&self, y_pred: ArrayView2<f32>, y: ArrayView2<f32>) -> Array2<f32> {
        let rows = y_pred.nrows().max(1) as f32;

        (softmax(y_pred) - &y) / rows
    }
}
