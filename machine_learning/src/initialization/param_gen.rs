use rand::Rng;

/// A `ParamGen` generates values for the initial state of the model's parameters.
pub trait ParamGen<R: Rng> {
    /// Should sample at most `n` parameters.
    ///
    /// # Arguments
    /// * `rng` - A random number generator.
    /// * `n` - The upper limit of samples to generate.
    ///
    /// # Returns
    /// An option whether the generator is exhausted.
    fn sample(&mut self, rng: &mut R, n: usize) -> Option<Vec<f32>>;
}

/// Takes up to `n` values out of a generator's `remaining` budget, `None` once it's spent.
pub(super) fn take_budget(remaining: &mut usize, n: usize) -> Option<usize> {
    if *remaining == 0 {
        return None;
    }

    let n = n.min(*remaining);
    *remaining -= n;
    Some(n)
}
