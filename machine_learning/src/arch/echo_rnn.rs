use ndarray::{Array2, Array3, ArrayView2, ArrayView3, Axis, s};

use super::{
    Model,
    activations::ActFn,
    layers::{Dense, Recurrent},
    loss::{LossFn, softmax},
};
use crate::{MlErr, Result, optimization::Optimizer, training::ParamManager};

const NLAYERS: usize = 2;

/// The echo network: a `Recurrent` cell unrolled over a window, whose every state is decoded
/// into class logits by a `Dense` layer.
#[derive(Clone)]
pub struct EchoRnn {
    cell: Recurrent,
    decoder: Dense,
}

/// The result of a forward pass over a window.
#[derive(Debug, Clone)]
pub struct Pass {
    /// `[steps * batch, classes]` logits, time-major.
    pub logits: Array2<f32>,
    /// The state after the window's last step.
    pub last_state: Array2<f32>,
    steps: usize,
    batch: usize,
}

impl Pass {
    /// Returns the class probabilities laid out as `[steps, batch, classes]`.
    pub fn probabilities(&self) -> Array3<f32> {
        let probs = softmax(self.logits.view());
        let mut out = Array3::zeros((self.steps, self.batch, probs.ncols()));

        for t in 0..self.steps {
            out.index_axis_mut(Axis(0), t)
                .assign(&probs.slice(s![t * self.batch..(t + 1) * self.batch, ..]));
        }

        out
    }
}

/// The outcome of training on a single window.
#[derive(Debug, Clone)]
pub struct WindowStep {
    /// The window's average loss, before the parameter update.
    pub loss: f32,
    /// The state to carry into the next window.
    pub last_state: Array2<f32>,
    /// `[steps, batch, classes]` class probabilities, before the parameter update.
    pub predictions: Array3<f32>,
}

impl EchoRnn {
    /// Creates a new `EchoRnn`.
    ///
    /// # Arguments
    /// * `input_size` - The width of each step's encoded input.
    /// * `state_size` - The width of the hidden state.
    /// * `num_classes` - The amount of output classes.
    /// * `act_fn` - The recurrent cell's nonlinearity.
    pub fn new(input_size: usize, state_size: usize, num_classes: usize, act_fn: ActFn) -> Self {
        Self {
            cell: Recurrent::new(input_size, state_size, act_fn),
            decoder: Dense::new((state_size, num_classes), None),
        }
    }

    pub fn input_size(&self) -> usize {
        self.cell.input_size()
    }

    pub fn state_size(&self) -> usize {
        self.cell.state_size()
    }

    pub fn num_classes(&self) -> usize {
        self.decoder.dim().1
    }

    /// Names and shapes the parameter buffer's sections, in buffer order.
    pub fn layout(&self) -> Vec<(&'static str, Vec<usize>)> {
        let (inputs, state) = (self.input_size(), self.state_size());
        let classes = self.num_classes();

        vec![
            ("cell/kernel", vec![inputs + state, state]),
            ("cell/bias", vec![state]),
            ("decoder/kernel", vec![state, classes]),
            ("decoder/bias", vec![classes]),
        ]
    }

    /// Runs the window's inputs through the cell and decodes every produced state.
    ///
    /// # Arguments
    /// * `param_manager` - The manager of parameters.
    /// * `inputs` - A `[batch, steps, input_size]` tensor.
    /// * `init_state` - The `[batch, state_size]` state the window starts from.
    pub fn forward(
        &mut self,
        param_manager: &ParamManager,
        inputs: ArrayView3<f32>,
        init_state: ArrayView2<f32>,
    ) -> Result<Pass> {
        let (batch, steps, _) = inputs.dim();
        let expected = (batch, self.state_size());
        if init_state.dim() != expected {
            return Err(MlErr::SizeMismatch {
                what: "initial state",
                got: init_state.len(),
                expected: expected.0 * expected.1,
            });
        }

        let mut front = param_manager.front();
        let cell_params = front.next().ok_or(missing_layer(0))?;
        let decoder_params = front.next().ok_or(missing_layer(1))?;

        let states = self.cell.forward(cell_params, inputs, init_state)?;
        let logits = self.decoder.forward(decoder_params, states.view())?;

        let last_state = match steps {
            0 => init_state.to_owned(),
            _ => states.slice(s![(steps - 1) * batch.., ..]).to_owned(),
        };

        Ok(Pass {
            logits,
            last_state,
            steps,
            batch,
        })
    }

    /// Returns the `[steps, batch, classes]` class probabilities for the window and the state
    /// after its last step, without touching the gradient.
    pub fn predict(
        &mut self,
        param_manager: &ParamManager,
        inputs: ArrayView3<f32>,
        init_state: ArrayView2<f32>,
    ) -> Result<(Array3<f32>, Array2<f32>)> {
        let pass = self.forward(param_manager, inputs, init_state)?;
        Ok((pass.probabilities(), pass.last_state))
    }

    /// Backpropagates the loss of the last `forward` call, `pass`, against `targets` and
    /// accumulates the gradient in the parameter manager.
    ///
    /// # Arguments
    /// * `param_manager` - The manager of parameters.
    /// * `loss_fn` - The loss function, applied to the logits.
    /// * `pass` - The result of the last forward pass.
    /// * `targets` - A `[batch, steps, classes]` tensor of expected class distributions.
    ///
    /// # Returns
    /// The loss of the window.
    pub fn backward<L: LossFn>(
        &mut self,
        param_manager: &mut ParamManager,
        loss_fn: &L,
        pass: &Pass,
        targets: ArrayView3<f32>,
    ) -> Result<f32> {
        let expected = (pass.batch, pass.steps, self.num_classes());
        if targets.dim() != expected {
            return Err(MlErr::SizeMismatch {
                what: "targets",
                got: targets.len(),
                expected: expected.0 * expected.1 * expected.2,
            });
        }

        let y = time_major(targets);
        let loss = loss_fn.loss(pass.logits.view(), y.view());
        let d = loss_fn.loss_prime(pass.logits.view(), y.view());

        let mut back = param_manager.back();
        let (decoder_params, decoder_grad) = back.next().ok_or(missing_layer(1))?;
        let d_states = self.decoder.backward(decoder_params, decoder_grad, d)?;

        let (cell_params, cell_grad) = back.next().ok_or(missing_layer(0))?;
        self.cell.backward(cell_params, cell_grad, d_states.view())?;

        Ok(loss)
    }

    /// Trains on a single window: forward pass, backpropagation through the window and a
    /// parameter update. The gradient does not flow into `init_state`.
    pub fn train_window<L, O>(
        &mut self,
        param_manager: &mut ParamManager,
        optimizer: &mut O,
        loss_fn: &L,
        inputs: ArrayView3<f32>,
        targets: ArrayView3<f32>,
        init_state: ArrayView2<f32>,
    ) -> Result<WindowStep>
    where
        L: LossFn,
        O: Optimizer + ?Sized,
    {
        param_manager.zero_grad();

        let pass = self.forward(param_manager, inputs, init_state)?;
        let loss = self.backward(param_manager, loss_fn, &pass, targets)?;
        param_manager.optimize(optimizer)?;

        Ok(WindowStep {
            loss,
            predictions: pass.probabilities(),
            last_state: pass.last_state,
        })
    }
}

impl Model for EchoRnn {
    fn layer_sizes(&self) -> Vec<usize> {
        vec![self.cell.size(), self.decoder.size()]
    }
}

fn missing_layer(got: usize) -> MlErr {
    MlErr::SizeMismatch {
        what: "layers",
        got,
        expected: NLAYERS,
    }
}

/// Lays a `[batch, steps, width]` tensor out as `[steps * batch, width]`, time-major.
fn time_major(x: ArrayView3<f32>) -> Array2<f32> {
    let (batch, steps, width) = x.dim();
    let mut out = Array2::zeros((steps * batch, width));

    for t in 0..steps {
        out.slice_mut(s![t * batch..(t + 1) * batch, ..])
            .assign(&x.index_axis(Axis(1), t));
    }

    out
}
