use rand::Rng;

use super::{ParamGen, param_gen::take_budget};

/// Fills a section of the parameters with a single value, biases usually.
#[derive(Debug, Clone)]
pub struct ConstParamGen {
    value: f32,
    remaining: usize,
}

impl ConstParamGen {
    /// Creates a generator of `limit` copies of `value`.
    pub fn new(value: f32, limit: usize) -> Self {
        Self {
            value,
            remaining: limit,
        }
    }
}

impl<R: Rng> ParamGen<R> for ConstParamGen {
    fn sample(&mut self, _: &mut R, n: usize) -> Option<Vec<f32>> {
        take_budget(&mut self.remaining, n).map(|n| vec![self.value; n])
    }
}
