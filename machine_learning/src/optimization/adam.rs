use super::{Optimizer, optimizer::check_sizes};
use crate::Result;

/// Adam, with bias corrected first and second moment estimates.
#[derive(Debug)]
pub struct Adam {
    lr: f32,
    b1: f32,
    b2: f32,
    eps: f32,
    t: i32,
    m: Vec<f32>,
    v: Vec<f32>,
}

impl Adam {
    /// Creates a new `Adam` optimizer.
    ///
    /// # Arguments
    /// * `len` - The amount of parameters to optimize.
    /// * `lr` - The learning rate.
    /// * `b1` - The decay of the first moment estimate.
    /// * `b2` - The decay of the second moment estimate.
    /// * `eps` - Added to the denominator of every update.
    pub fn new(len: usize, lr: f32, b1: f32, b2: f32, eps: f32) -> Self {
        Self {
            lr,
            b1,
            b2,
            eps,
            t: 0,
            m: vec![0.; len],
            v: vec![0.; len],
        }
    }

    /// `b1 = 0.9`, `b2 = 0.999` and `eps = 1e-8`.
    pub fn with_learning_rate(len: usize, lr: f32) -> Self {
        Self::new(len, lr, 0.9, 0.999, 1e-8)
    }
}

impl Optimizer for Adam {
    fn update_params(&mut self, grad: &[f32], params: &mut [f32]) -> Result<()> {
        check_sizes(grad, params, Some(self.m.len()))?;

        self.t = self.t.saturating_add(1);
        let (b1, b2) = (self.b1, self.b2);
        let m_correction = 1. - b1.powi(self.t);
        let v_correction = 1. - b2.powi(self.t);

        for (i, (p, &g)) in params.iter_mut().zip(grad).enumerate() {
            self.m[i] = b1 * self.m[i] + (1. - b1) * g;
            self.v[i] = b2 * self.v[i] + (1. - b2) * g * g;

            let m_hat = self.m[i] / m_correction;
            let v_hat = self.v[i] / v_correction;
            *p -= self.lr * m_hat / (v_hat.sqrt() + self.eps);
        }

        Ok(())
    }
}
