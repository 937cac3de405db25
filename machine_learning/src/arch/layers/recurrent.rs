use ndarray::{Array2, ArrayView2, ArrayView3, Axis, concatenate, s};

use super::{check_len, view_affine, view_affine_mut};
use crate::{Result, arch::activations::ActFn};

/// A plain recurrent cell unrolled over a window of steps.
///
/// At each step the cell concatenates the step's input with the previous state and computes
/// `h_t = act([x_t, h_{t-1}] · W + b)`. The weights are laid out as an
/// `(input_size + state_size) x state_size` matrix, input rows first, followed by the
/// `state_size` biases.
#[derive(Clone)]
pub struct Recurrent {
    input_size: usize,
    state_size: usize,
    act_fn: ActFn,

    // Forward metadata, one entry per unrolled step
    xh: Vec<Array2<f32>>,
    z: Vec<Array2<f32>>,
}

impl Recurrent {
    /// Creates a new `Recurrent` layer.
    ///
    /// # Arguments
    /// * `input_size` - The width of each step's input.
    /// * `state_size` - The width of the hidden state.
    /// * `act_fn` - The saturating nonlinearity applied to each new state.
    pub fn new(input_size: usize, state_size: usize, act_fn: ActFn) -> Self {
        Self {
            input_size,
            state_size,
            act_fn,
            xh: Vec::new(),
            z: Vec::new(),
        }
    }

    /// Returns the amount of parameters this layer has.
    pub fn size(&self) -> usize {
        (self.input_size + self.state_size + 1) * self.state_size
    }

    pub fn input_size(&self) -> usize {
        self.input_size
    }

    pub fn state_size(&self) -> usize {
        self.state_size
    }

    fn dim(&self) -> (usize, usize) {
        (self.input_size + self.state_size, self.state_size)
    }

    /// Computes a single step of the cell.
    pub fn step(
        &self,
        params: &[f32],
        x: ArrayView2<f32>,
        h: ArrayView2<f32>,
    ) -> Result<Array2<f32>> {
        let (_, z) = self.affine(params, x, h)?;
        Ok(z.mapv(|z| self.act_fn.f(z)))
    }

    fn affine(
        &self,
        params: &[f32],
        x: ArrayView2<f32>,
        h: ArrayView2<f32>,
    ) -> Result<(Array2<f32>, Array2<f32>)> {
        check_len("recurrent input", x.ncols(), self.input_size)?;
        check_len("recurrent state", h.ncols(), self.state_size)?;
        check_len("recurrent batch", h.nrows(), x.nrows())?;

        let (w, b) = view_affine(self.dim(), params)?;
        let xh = concatenate(Axis(1), &[x, h])?;
        let z = xh.dot(&w) + &b;
        Ok((xh, z))
    }

    /// Unrolls the cell over every step of `inputs`, starting from `init_state`.
    ///
    /// # Arguments
    /// * `params` - The layer's parameters.
    /// * `inputs` - A `[batch, steps, input_size]` tensor.
    /// * `init_state` - The `[batch, state_size]` state the window starts from.
    ///
    /// # Returns
    /// Every produced state stacked time-major, that is, a `[steps * batch, state_size]` matrix
    /// where rows `t * batch..(t + 1) * batch` hold the states after step `t`.
    pub fn forward(
        &mut self,
        params: &[f32],
        inputs: ArrayView3<f32>,
        init_state: ArrayView2<f32>,
    ) -> Result<Array2<f32>> {
        let (batch, steps, _) = inputs.dim();
        check_len("recurrent batch", init_state.nrows(), batch)?;

        self.xh.clear();
        self.z.clear();

        let mut states = Array2::zeros((steps * batch, self.state_size));
        let mut h = init_state.to_owned();

        for t in 0..steps {
            let x = inputs.index_axis(Axis(1), t);
            let (xh, z) = self.affine(params, x, h.view())?;
            h = z.mapv(|z| self.act_fn.f(z));

            states.slice_mut(s![t * batch..(t + 1) * batch, ..]).assign(&h);
            self.xh.push(xh);
            self.z.push(z);
        }

        Ok(states)
    }

    /// Backpropagates through every step of the last `forward` call.
    ///
    /// Accumulates the layer's gradient given the derivative of the loss with respect to each
    /// stacked state, `d_states`, and returns the derivative with respect to the initial state.
    pub fn backward(
        &mut self,
        params: &[f32],
        grad: &mut [f32],
        d_states: ArrayView2<f32>,
    ) -> Result<Array2<f32>> {
        let steps = self.z.len();
        let batch = self.z.first().map_or(0, |z| z.nrows());
        check_len("recurrent delta rows", d_states.nrows(), steps * batch)?;
        check_len("recurrent delta columns", d_states.ncols(), self.state_size)?;

        let (w, _) = view_affine(self.dim(), params)?;
        let w_state = w.slice(s![self.input_size.., ..]);
        let (mut dw, mut db) = view_affine_mut(self.dim(), grad)?;

        let mut dh = Array2::zeros((batch, self.state_size));

        for t in (0..steps).rev() {
            let mut dz = &d_states.slice(s![t * batch..(t + 1) * batch, ..]) + &dh;
            dz.zip_mut_with(&self.z[t], |d, &z| *d *= self.act_fn.df(z));

            dw += &self.xh[t].t().dot(&dz);
            db += &dz.sum_axis(Axis(0));
            dh = dz.dot(&w_state.t());
        }

        Ok(dh)
    }
}

#[cfg(test)]
mod tests {
    use ndarray::{Array3, array};

    use super::*;

    fn params(cell: &Recurrent) -> Vec<f32> {
        (0..cell.size()).map(|i| (i as f32 * 0.37).sin() * 0.5).collect()
    }

    #[test]
    fn forward_matches_stepping() {
        let mut cell = Recurrent::new(1, 3, ActFn::tanh());
        let params = params(&cell);
        let inputs = Array3::from_shape_fn((2, 4, 1), |(b, t, _)| ((b + t) % 2) as f32);
        let init = Array2::from_elem((2, 3), 0.1);

        let states = cell.forward(&params, inputs.view(), init.view()).unwrap();
        assert_eq!(states.dim(), (8, 3));

        let mut h = init.clone();
        for t in 0..4 {
            h = cell
                .step(&params, inputs.index_axis(Axis(1), t), h.view())
                .unwrap();
            assert_eq!(states.slice(s![t * 2..(t + 1) * 2, ..]), h);
        }
    }

    #[test]
    fn states_are_saturated() {
        let mut cell = Recurrent::new(1, 2, ActFn::tanh());
        let params = vec![10.; cell.size()];
        let inputs = Array3::from_elem((1, 3, 1), 1.);

        let states = cell
            .forward(&params, inputs.view(), Array2::<f32>::zeros((1, 2)).view())
            .unwrap();
        assert!(states.iter().all(|h| h.abs() <= 1.));
    }

    #[test]
    fn empty_window() {
        let mut cell = Recurrent::new(1, 2, ActFn::tanh());
        let params = params(&cell);
        let inputs = Array3::<f32>::zeros((3, 0, 1));
        let init = Array2::<f32>::zeros((3, 2));

        let states = cell.forward(&params, inputs.view(), init.view()).unwrap();
        assert_eq!(states.nrows(), 0);

        let mut grad = vec![0.; cell.size()];
        let dh = cell.backward(&params, &mut grad, states.view()).unwrap();
        assert_eq!(dh.nrows(), 0);
        assert!(grad.iter().all(|&g| g == 0.));
    }

    #[test]
    fn gradient_matches_finite_differences() {
        let mut cell = Recurrent::new(2, 3, ActFn::tanh());
        let params = params(&cell);
        let inputs = Array3::from_shape_fn((2, 3, 2), |(b, t, i)| (b + 2 * t + i) as f32 * 0.2);
        let init = array![[0.1, -0.2, 0.3], [0.0, 0.5, -0.5]];

        // loss = sum of all states
        let states = cell.forward(&params, inputs.view(), init.view()).unwrap();
        let mut grad = vec![0.; cell.size()];
        cell.backward(&params, &mut grad, Array2::<f32>::ones(states.dim()).view())
            .unwrap();

        let h = 1e-2;
        for i in 0..params.len() {
            let mut plus = params.clone();
            plus[i] += h;
            let mut minus = params.clone();
            minus[i] -= h;

            let loss_plus = cell.forward(&plus, inputs.view(), init.view()).unwrap().sum();
            let loss_minus = cell.forward(&minus, inputs.view(), init.view()).unwrap().sum();
            let numeric = (loss_plus - loss_minus) / (2. * h);

            assert!(
                (numeric - grad[i]).abs() < 1e-2,
                "param {i}: numeric {numeric}, analytic {}",
                grad[i]
            );
        }
    }
}
