use rand::Rng;
use rand_distr::{Distribution, Normal, NormalError, Uniform, uniform::Error as UniformError};

use super::{ParamGen, param_gen::take_budget};

/// A parameter generator that follows a certain probabilistic distribution.
pub struct RandParamGen<D: Distribution<f32>> {
    distribution: D,
    remaining: usize,
}

impl<D: Distribution<f32>> RandParamGen<D> {
    /// Creates a new `RandParamGen` parameter generator.
    ///
    /// # Arguments
    /// * `distribution` - The distribution to sample the random numbers from.
    /// * `limit` - The maximum amount of numbers to generate.
    pub fn new(distribution: D, limit: usize) -> Self {
        Self {
            distribution,
            remaining: limit,
        }
    }
}

impl RandParamGen<Uniform<f32>> {
    /// Creates a new `RandParamGen` parameter generator with a uniform distribution.
    ///
    /// # Arguments
    /// * `limit` - The maximum amount of numbers to generate.
    /// * `low` - The incluive lower limit.
    /// * `high` - The exclusive upper limit.
    ///
    /// # Returns
    /// An error if the range is invalid (low >= high).
    pub fn uniform(limit: usize, low: f32, high: f32) -> Result<Self, UniformError> {
        Ok(Self::new(Uniform::new(low, high)?, limit))
    }

    /// Same as `uniform` but with an inclusive upper limit.
    pub fn uniform_inclusive(limit: usize, low: f32, high: f32) -> Result<Self, UniformError> {
        Ok(Self::new(Uniform::new_inclusive(low, high)?, limit))
    }

    /// Creates a new `RandParamGen` parameter generator using Xavier uniform initialization.
    ///
    /// # Arguments
    /// * `limit` - The maximum amount of numbers to generate.
    /// * `fan_in` - The number of input units in the weight tensor.
    /// * `fan_out` - The number of output units in the weight tensor.
    ///
    /// # Returns
    /// An error if the calculated range is invalid.
    pub fn xavier_uniform(
        limit: usize,
        fan_in: usize,
        fan_out: usize,
    ) -> Result<Self, UniformError> {
        let range = (6. / (fan_in + fan_out) as f32).sqrt();
        Self::uniform(limit, -range, range)
    }
}

impl RandParamGen<Normal<f32>> {
    /// Creates a new `RandParamGen` parameter generator with a normal distribution.
    ///
    /// # Arguments
    /// * `limit` - The maximum amount of numbers to generate.
    /// * `mean` - The mean of the distribution.
    /// * `std_dev` - The standard deviation of the distribution.
    ///
    /// # Returns
    /// An error if `std_dev` is not finite (Nan or infinite).
    pub fn normal(limit: usize, mean: f32, std_dev: f32) -> Result<Self, NormalError> {
        Ok(Self::new(Normal::new(mean, std_dev)?, limit))
    }
}

impl<R: Rng, D: Distribution<f32>> ParamGen<R> for RandParamGen<D> {
    fn sample(&mut self, rng: &mut R, n: usize) -> Option<Vec<f32>> {
        let n = take_budget(&mut self.remaining, n)?;
        Some((0..n).map(|_| self.distribution.sample(rng)).collect())
    }
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;

    #[test]
    fn uniform_stays_in_range() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut param_gen = RandParamGen::uniform(100, 0., 1.).unwrap();
        let sample = param_gen.sample(&mut rng, 100).unwrap();

        assert_eq!(sample.len(), 100);
        assert!(sample.iter().all(|&p| (0. ..1.).contains(&p)));
        assert!(param_gen.sample(&mut rng, 1).is_none());
    }

    #[test]
    fn invalid_ranges() {
        assert!(RandParamGen::uniform(1, 1., 0.).is_err());
        assert!(RandParamGen::uniform(1, 1., 1.).is_err());
        assert!(RandParamGen::uniform_inclusive(1, 1., 1.).is_ok());
        assert!(RandParamGen::normal(1, 0., f32::NAN).is_err());
    }

    #[test]
    fn partial() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut param_gen = RandParamGen::normal(10, 0., 1.).unwrap();

        assert_eq!(param_gen.sample(&mut rng, 7).unwrap().len(), 7);
        assert_eq!(param_gen.sample(&mut rng, 7).unwrap().len(), 3);
        assert!(param_gen.sample(&mut rng, 1).is_none());
    }
}
