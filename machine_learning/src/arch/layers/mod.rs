mod dense;
mod recurrent;

pub use dense::Dense;
pub use recurrent::Recurrent;

use ndarray::{ArrayView1, ArrayView2, ArrayViewMut1, ArrayViewMut2};

use crate::{MlErr, Result};

/// Checks that a layer got exactly the amount of parameters it owns.
fn check_len(what: &'static str, got: usize, expected: usize) -> Result<()> {
    if got != expected {
        return Err(MlErr::SizeMismatch {
            what,
            got,
            expected,
        });
    }

    Ok(())
}

/// Gives a view of a raw parameter slice as a `dim` weight matrix followed by its biases.
fn view_affine(
    dim: (usize, usize),
    params: &[f32],
) -> Result<(ArrayView2<'_, f32>, ArrayView1<'_, f32>)> {
    let w_size = dim.0 * dim.1;
    check_len("layer parameters", params.len(), w_size + dim.1)?;

    let (w_raw, b_raw) = params.split_at(w_size);
    let weights = ArrayView2::from_shape(dim, w_raw)?;
    let biases = ArrayView1::from_shape(dim.1, b_raw)?;
    Ok((weights, biases))
}

/// Gives a view of a raw gradient slice as the delta weights and delta biases of a `dim` layer.
fn view_affine_mut(
    dim: (usize, usize),
    grad: &mut [f32],
) -> Result<(ArrayViewMut2<'_, f32>, ArrayViewMut1<'_, f32>)> {
    let w_size = dim.0 * dim.1;
    check_len("layer gradient", grad.len(), w_size + dim.1)?;

    let (dw_raw, db_raw) = grad.split_at_mut(w_size);
    let dw = ArrayViewMut2::from_shape(dim, dw_raw)?;
    let db = ArrayViewMut1::from_shape(dim.1, db_raw)?;
    Ok((dw, db))
}
