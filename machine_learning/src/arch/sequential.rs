use ndarray::{Array2, ArrayView2};

use super::{Model, layers::Dense, loss::LossFn};
use crate::{MlErr, Result, optimization::Optimizer, training::ParamManager};

/// A sequential model: information flows forward when computing an output and backward when
/// computing the *deltas* of its layers.
#[derive(Clone)]
pub struct Sequential {
    layers: Vec<Dense>,
}

impl Sequential {
    /// Creates a new `Sequential`.
    ///
    /// # Arguments
    /// * `layers` - The layers the sequential is composed of.
    ///
    /// # Returns
    /// A new `Sequential` instance.
    pub fn new<I>(layers: I) -> Self
    where
        I: IntoIterator<Item = Dense>,
    {
        Self {
            layers: layers.into_iter().collect(),
        }
    }

    /// Makes a forward pass through the network.
    ///
    /// # Arguments
    /// * `param_manager` - The manager of parameters.
    /// * `x` - The input data.
    ///
    /// # Returns
    /// The prediction for the given input or an error if occurred.
    pub fn forward(
        &mut self,
        param_manager: &ParamManager,
        x: ArrayView2<f32>,
    ) -> Result<Array2<f32>> {
        let mut front = param_manager.front();
        let nlayers = self.layers.len();
        let mut x = x.to_owned();

        for (i, layer) in self.layers.iter_mut().enumerate() {
            let params = front.next().ok_or(MlErr::SizeMismatch {
                what: "layers",
                got: i,
                expected: nlayers,
            })?;

            x = layer.forward(params, x.view())?;
        }

        Ok(x)
    }

    /// Runs one optimization step per batch, **updating the parameters** after each of them.
    ///
    /// # Arguments
    /// * `param_manager` - The manager of parameters.
    /// * `optimizer` - The optimizer that dictates how to update the parameters.
    /// * `loss_fn` - The loss function.
    /// * `batches` - The `(x, y)` batches of data.
    ///
    /// # Returns
    /// The average loss over the batches.
    pub fn backprop<'a, O, L, I>(
        &mut self,
        param_manager: &mut ParamManager,
        optimizer: &mut O,
        loss_fn: &L,
        batches: I,
    ) -> Result<f32>
    where
        O: Optimizer + ?Sized,
        L: LossFn,
        I: IntoIterator<Item = (ArrayView2<'a, f32>, ArrayView2<'a, f32>)>,
    {
        let nlayers = self.layers.len();
        let mut total_loss = 0.0;
        let mut num_batches = 0;

        for (x, y) in batches {
            param_manager.zero_grad();

            let y_pred = self.forward(param_manager, x)?;
            if y.dim() != y_pred.dim() {
                return Err(MlErr::SizeMismatch {
                    what: "targets",
                    got: y.len(),
                    expected: y_pred.len(),
                });
            }

            total_loss += loss_fn.loss(y_pred.view(), y);
            num_batches += 1;

            let mut back = param_manager.back();
            let mut d = loss_fn.loss_prime(y_pred.view(), y);

            for (i, layer) in self.layers.iter_mut().rev().enumerate() {
                let (params, grad) = back.next().ok_or(MlErr::SizeMismatch {
                    what: "layers",
                    got: i,
                    expected: nlayers,
                })?;

                d = layer.backward(params, grad, d)?;
            }

            param_manager.optimize(optimizer)?;
        }

        Ok(total_loss / num_batches.max(1) as f32)
    }
}

impl Model for Sequential {
    fn layer_sizes(&self) -> Vec<usize> {
        self.layers.iter().map(Dense::size).collect()
    }
}

#[cfg(test)]
mod tests {
    use ndarray::array;

    use super::*;
    use crate::{
        arch::{activations::ActFn, loss::Mse},
        optimization::GradientDescent,
    };

    #[test]
    fn fits_a_line() {
        let mut model = Sequential::new([Dense::new((1, 1), None)]);
        let mut param_manager =
            ParamManager::new(vec![0.0; model.size()], model.layer_sizes()).unwrap();
        let mut optimizer = GradientDescent::new(0.1);

        let x = array![[0.], [1.], [2.]];
        let y = array![[1.], [3.], [5.]];

        let mut loss = f32::INFINITY;
        for _ in 0..2000 {
            loss = model
                .backprop(
                    &mut param_manager,
                    &mut optimizer,
                    &Mse,
                    [(x.view(), y.view())],
                )
                .unwrap();
        }

        assert!(loss < 1e-4, "loss: {loss}");
        let [w, b] = param_manager.params() else {
            panic!("expected two parameters");
        };
        assert!((w - 2.).abs() < 1e-2 && (b - 1.).abs() < 1e-2);
    }

    #[test]
    fn layer_sizes() {
        let model = Sequential::new([
            Dense::new((2, 3), Some(ActFn::sigmoid(1.))),
            Dense::new((3, 1), None),
        ]);

        assert_eq!(model.layer_sizes(), [9, 4]);
        assert_eq!(model.size(), 13);
    }

    #[test]
    fn missing_parameters() {
        let mut model = Sequential::new([Dense::new((1, 1), None), Dense::new((1, 1), None)]);
        let param_manager = ParamManager::new(vec![0.0; 2], vec![2]).unwrap();

        assert!(model.forward(&param_manager, array![[1.]].view()).is_err());
    }

    #[test]
    fn mismatched_targets() {
        let mut model = Sequential::new([Dense::new((1, 1), None)]);
        let mut param_manager = ParamManager::new(vec![0.5, 0.0], model.layer_sizes()).unwrap();
        let mut optimizer = GradientDescent::new(0.1);

        let x = array![[0.], [1.], [2.]];
        let y = array![[0.], [1.]];
        let result = model.backprop(
            &mut param_manager,
            &mut optimizer,
            &Mse,
            [(x.view(), y.view())],
        );

        assert!(matches!(result, Err(MlErr::SizeMismatch { what: "targets", .. })));
        assert_eq!(param_manager.params(), [0.5, 0.0]);
    }
}
