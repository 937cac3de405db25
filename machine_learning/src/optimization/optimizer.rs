use crate::Result;

/// Defines the strategy for updating model parameters based on calculated gradients.
pub trait Optimizer {
    /// Updates the provided slice of parameters using the accumulated gradient.
    ///
    /// # Arguments
    /// * `grad` - A reference to the model's gradient.
    /// * `params` - The parameters to update.
    ///
    /// # Returns
    /// An error if there's a mismatch in the sizes of `grad` and `params`.
    fn update_params(&mut self, grad: &[f32], params: &mut [f32]) -> Result<()>;
}

/// Checks that `grad`, `params` and an optimizer's per-parameter state all have the same length.
pub(super) fn check_sizes(grad: &[f32], params: &[f32], state: Option<usize>) -> Result<()> {
    use crate::MlErr;

    if grad.len() != params.len() {
        return Err(MlErr::SizeMismatch {
            what: "gradient",
            got: grad.len(),
            expected: params.len(),
        });
    }

    match state {
        Some(len) if len != params.len() => Err(MlErr::SizeMismatch {
            what: "optimizer state",
            got: len,
            expected: params.len(),
        }),
        _ => Ok(()),
    }
}
