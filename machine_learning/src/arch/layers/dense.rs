use ndarray::{Array2, ArrayView2, Axis};

use super::{check_len, view_affine, view_affine_mut};
use crate::{Result, arch::activations::ActFn};

/// A fully connected layer: `a = act(x · W + b)`, or just the affine part when it has no
/// activation function.
#[derive(Clone)]
pub struct Dense {
    dim: (usize, usize),
    act_fn: Option<ActFn>,

    // Forward metadata
    x: Array2<f32>,
    z: Array2<f32>,
}

impl Dense {
    /// Creates a new `Dense` layer.
    ///
    /// # Arguments
    /// * `dim` - The amount of inputs and outputs of the layer.
    /// * `act_fn` - The activation function, if any.
    pub fn new(dim: (usize, usize), act_fn: Option<ActFn>) -> Self {
        Self {
            dim,
            act_fn,
            x: Array2::zeros((0, dim.0)),
            z: Array2::zeros((0, dim.1)),
        }
    }

    /// Returns the size of this layer.
    ///
    /// # Returns
    /// The amount of parameters this layer has.
    pub fn size(&self) -> usize {
        (self.dim.0 + 1) * self.dim.1
    }

    pub fn dim(&self) -> (usize, usize) {
        self.dim
    }

    /// Computes the output of the layer for every row of `x`, keeping what the backward pass
    /// needs.
    pub fn forward(&mut self, params: &[f32], x: ArrayView2<f32>) -> Result<Array2<f32>> {
        check_len("dense input", x.ncols(), self.dim.0)?;
        let (w, b) = view_affine(self.dim, params)?;

        let z = x.dot(&w) + &b;
        self.x = x.to_owned();

        let Some(ref act_fn) = self.act_fn else {
            self.z = z.clone();
            return Ok(z);
        };

        let a = z.mapv(|z| act_fn.f(z));
        self.z = z;
        Ok(a)
    }

    /// Accumulates this layer's gradient given the derivative of the loss with respect to its
    /// output, `d`, and returns the derivative with respect to its input.
    pub fn backward(
        &mut self,
        params: &[f32],
        grad: &mut [f32],
        mut d: Array2<f32>,
    ) -> Result<Array2<f32>> {
        check_len("dense delta rows", d.nrows(), self.z.nrows())?;
        check_len("dense delta columns", d.ncols(), self.dim.1)?;

        if let Some(act_fn) = &self.act_fn {
            d.zip_mut_with(&self.z, |d, &z| *d *= act_fn.df(z));
        }

        let (mut dw, mut db) = view_affine_mut(self.dim, grad)?;
        dw += &self.x.t().dot(&d);
        db += &d.sum_axis(Axis(0));

        let (w, _) = view_affine(self.dim, params)?;
        Ok(d.dot(&w.t()))
    }
}
