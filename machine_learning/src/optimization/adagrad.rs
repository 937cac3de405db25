use super::{Optimizer, optimizer::check_sizes};
use crate::Result;

/// Adagrad: gradient descent with a per-parameter learning rate that shrinks with the sum of
/// that parameter's past squared gradients.
#[derive(Debug)]
pub struct Adagrad {
    learning_rate: f32,
    accumulator: Box<[f32]>,
}

impl Adagrad {
    /// The accumulator's starting value when none is given.
    pub const INITIAL_ACCUMULATOR: f32 = 0.1;

    /// Creates a new `Adagrad` optimizer.
    ///
    /// # Arguments
    /// * `len` - The amount of parameters this instance should hold.
    /// * `learning_rate` - The small coefficient that modulates the amount of training per update.
    /// * `initial_accumulator` - The starting value of every squared gradient sum, must be positive.
    ///
    /// # Returns
    /// A new `Adagrad` instance.
    pub fn new(len: usize, learning_rate: f32, initial_accumulator: f32) -> Self {
        Self {
            learning_rate,
            accumulator: vec![initial_accumulator; len].into_boxed_slice(),
        }
    }
}

impl Optimizer for Adagrad {
    fn update_params(&mut self, grad: &[f32], params: &mut [f32]) -> Result<()> {
        check_sizes(grad, params, Some(self.accumulator.len()))?;

        let lr = self.learning_rate;

        params
            .iter_mut()
            .zip(grad)
            .zip(self.accumulator.iter_mut())
            .for_each(|((p, g), acc)| {
                *acc += g.powi(2);
                *p -= lr * g / acc.sqrt();
            });

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn steps_shrink() {
        let mut optimizer = Adagrad::new(1, 1.0, 0.0);
        let mut params = [0.0];

        optimizer.update_params(&[1.0], &mut params).unwrap();
        assert_eq!(params, [-1.0]);

        // acc = 2, step = 1 / sqrt(2)
        optimizer.update_params(&[1.0], &mut params).unwrap();
        assert!((params[0] + 1.0 + 1.0 / 2f32.sqrt()).abs() < 1e-6);
    }

    #[test]
    fn zero_gradient_keeps_params() {
        let mut optimizer = Adagrad::new(2, 0.5, Adagrad::INITIAL_ACCUMULATOR);
        let mut params = [3.0, -3.0];

        optimizer.update_params(&[0.0, 0.0], &mut params).unwrap();
        assert_eq!(params, [3.0, -3.0]);
    }

    #[test]
    fn state_size_mismatch() {
        let mut optimizer = Adagrad::new(3, 0.5, 0.1);
        assert!(optimizer.update_params(&[0.0; 2], &mut [0.0; 2]).is_err());
    }
}
