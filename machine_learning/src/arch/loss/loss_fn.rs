use ndarray::{Array2, ArrayView2};

/// A loss function over a batch of rows.
pub trait LossFn {
    /// Returns the scalar loss of `y_pred` against the expected `y`.
    fn loss(&self, y_pred: ArrayView2<f32>, y: ArrayView2<f32>) -> f32;

    /// Returns the derivative of `loss` with respect to each entry of `y_pred`.
    fn loss_prime(&self, y_pred: ArrayView2<f32>, y: ArrayView2<f32>) -> Array2<f32>;
}
