use rand::Rng;

use crate::{MlErr, Result, arch::Model, initialization::ParamGen, optimization::Optimizer};

/// The manager of parameters. Owns the model's flat parameter and gradient buffers and hands out
/// the slice that belongs to each layer when traversing the model forwards and backwards.
#[derive(Debug, Clone)]
pub struct ParamManager {
    params: Vec<f32>,
    grad: Vec<f32>,
    layer_sizes: Vec<usize>,
}

impl ParamManager {
    /// Creates a new `ParamManager`.
    ///
    /// # Arguments
    /// * `params` - The initial parameters of every layer, laid out front to back.
    /// * `layer_sizes` - The amount of parameters of each layer.
    ///
    /// # Returns
    /// A new `ParamManager` instance or an error if the sizes don't add up to `params.len()`.
    pub fn new(params: Vec<f32>, layer_sizes: Vec<usize>) -> Result<Self> {
        let expected: usize = layer_sizes.iter().sum();
        if params.len() != expected {
            return Err(MlErr::SizeMismatch {
                what: "parameters",
                got: params.len(),
                expected,
            });
        }

        Ok(Self {
            grad: vec![0.0; params.len()],
            params,
            layer_sizes,
        })
    }

    /// Creates a new `ParamManager` for `model`, sampling its initial parameters from `param_gen`.
    ///
    /// # Arguments
    /// * `model` - The model whose parameters will be managed.
    /// * `param_gen` - The generator of the initial parameters.
    /// * `rng` - A random number generator.
    ///
    /// # Returns
    /// A new `ParamManager` or an error if the generator is exhausted too early.
    pub fn generate<M, G, R>(model: &M, param_gen: &mut G, rng: &mut R) -> Result<Self>
    where
        M: Model + ?Sized,
        G: ParamGen<R> + ?Sized,
        R: Rng,
    {
        let size = model.size();
        let params = param_gen.sample(rng, size).unwrap_or_default();

        if params.len() != size {
            return Err(MlErr::SizeMismatch {
                what: "initial parameters",
                got: params.len(),
                expected: size,
            });
        }

        Self::new(params, model.layer_sizes())
    }

    /// Creates a new `FrontIter` parameter iterator.
    ///
    /// The returned iterator iterates the model's layers forward.
    pub fn front(&self) -> FrontIter<'_> {
        FrontIter {
            params: &self.params,
            layer_sizes: &self.layer_sizes,
        }
    }

    /// Creates a new `BackIter` parameter iterator.
    ///
    /// The returned iterator iterates the model's layers backwards.
    pub fn back(&mut self) -> BackIter<'_> {
        BackIter {
            params: &self.params,
            grad: &mut self.grad,
            layer_sizes: &self.layer_sizes,
        }
    }

    /// Applies the gradient onto the parameters of the model.
    ///
    /// # Arguments
    /// * `optimizer` - The optimizer that dictates how to update the parameters.
    pub fn optimize<O: Optimizer + ?Sized>(&mut self, optimizer: &mut O) -> Result<()> {
        optimizer.update_params(&self.grad, &mut self.params)
    }

    /// Zeros out the gradient.
    pub fn zero_grad(&mut self) {
        self.grad.fill(0.0);
    }

    /// Overwrites every parameter with `values`.
    pub fn load(&mut self, values: &[f32]) -> Result<()> {
        if values.len() != self.params.len() {
            return Err(MlErr::SizeMismatch {
                what: "loaded parameters",
                got: values.len(),
                expected: self.params.len(),
            });
        }

        self.params.copy_from_slice(values);
        Ok(())
    }

    pub fn params(&self) -> &[f32] {
        &self.params
    }

    pub fn grad(&self) -> &[f32] {
        &self.grad
    }

    pub fn layer_sizes(&self) -> &[usize] {
        &self.layer_sizes
    }

    /// Returns the parameters of the `layer`-th layer, if any.
    pub fn layer_params(&self, layer: usize) -> Option<&[f32]> {
        self.front().nth(layer)
    }
}

/// A model's layer iterator.
///
/// This iterator iterates the layers of a model from the front.
pub struct FrontIter<'pm> {
    params: &'pm [f32],
    layer_sizes: &'pm [usize],
}

impl<'pm> Iterator for FrontIter<'pm> {
    type Item = &'pm [f32];

    fn next(&mut self) -> Option<Self::Item> {
        let (&size, rest) = self.layer_sizes.split_first()?;
        let (layer, params) = self.params.split_at_checked(size)?;

        self.layer_sizes = rest;
        self.params = params;
        Some(layer)
    }
}

/// A model's layer iterator.
///
/// This iterator iterates the layers of a model from the back, yielding each layer's parameters
/// along with its gradient.
pub struct BackIter<'pm> {
    params: &'pm [f32],
    grad: &'pm mut [f32],
    layer_sizes: &'pm [usize],
}

impl<'pm> Iterator for BackIter<'pm> {
    type Item = (&'pm [f32], &'pm mut [f32]);

    fn next(&mut self) -> Option<Self::Item> {
        let (&size, rest) = self.layer_sizes.split_last()?;
        let at = self.params.len().checked_sub(size)?;

        let (params, layer_params) = self.params.split_at(at);
        let (grad, layer_grad) = std::mem::take(&mut self.grad).split_at_mut(at);

        self.layer_sizes = rest;
        self.params = params;
        self.grad = grad;
        Some((layer_params, layer_grad))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimization::GradientDescent;

    const LAYER_SIZES: [usize; 4] = [9, 15, 5, 10];

    fn layered() -> ParamManager {
        let params = LAYER_SIZES
            .iter()
            .enumerate()
            .flat_map(|(i, &size)| vec![i as f32; size])
            .collect();

        ParamManager::new(params, LAYER_SIZES.to_vec()).unwrap()
    }

    #[test]
    fn rejects_wrong_sizes() {
        let err = ParamManager::new(vec![0.0; 3], vec![2, 2]).unwrap_err();
        assert!(matches!(
            err,
            MlErr::SizeMismatch {
                got: 3,
                expected: 4,
                ..
            }
        ));
    }

    #[test]
    fn front() {
        let manager = layered();
        let mut front = manager.front();

        for (i, &size) in LAYER_SIZES.iter().enumerate() {
            let params = front.next().unwrap();
            assert_eq!(params.len(), size);
            assert!(params.iter().all(|&p| p == i as f32));
        }

        assert!(front.next().is_none());
    }

    #[test]
    fn back() {
        let mut manager = layered();
        let mut back = manager.back();

        for (i, &size) in LAYER_SIZES.iter().enumerate().rev() {
            let (params, grad) = back.next().unwrap();
            assert_eq!(params.len(), size);
            assert_eq!(grad.len(), size);
            assert!(params.iter().all(|&p| p == i as f32));

            grad.fill(i as f32 + 1.0);
        }

        assert!(back.next().is_none());

        let mut offset = 0;
        for (i, &size) in LAYER_SIZES.iter().enumerate() {
            let grad = &manager.grad()[offset..offset + size];
            assert!(grad.iter().all(|&g| g == i as f32 + 1.0));
            offset += size;
        }
    }

    #[test]
    fn optimize_then_zero_grad() {
        let mut manager = ParamManager::new(vec![1.0, 2.0], vec![2]).unwrap();
        let (_, grad) = manager.back().next().unwrap();
        grad.copy_from_slice(&[1.0, -1.0]);

        manager.optimize(&mut GradientDescent::new(0.5)).unwrap();
        assert_eq!(manager.params(), [0.5, 2.5]);

        manager.zero_grad();
        assert_eq!(manager.grad(), [0.0, 0.0]);
    }

    #[test]
    fn load_checks_size() {
        let mut manager = layered();
        assert!(manager.load(&[0.0; 2]).is_err());

        let values = vec![7.0; manager.params().len()];
        manager.load(&values).unwrap();
        assert_eq!(manager.layer_params(2).unwrap(), [7.0; 5]);
    }
}
