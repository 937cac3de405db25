use rand::Rng;

use super::ParamGen;

/// A parameter generator that delegates the generation to a chain of parameter generators.
///
/// Handy whenever each section of the model (a layer's weights, its biases, ...) wants a
/// different generator: each link of the chain knows how many values it generates.
pub struct ChainedParamGen<R: Rng> {
    param_gens: Vec<Box<dyn ParamGen<R>>>,
    curr: usize,
}

impl<R: Rng> ChainedParamGen<R> {
    /// Creates a new `ChainedParamGen` parameter generator.
    ///
    /// # Arguments
    /// * `param_gens` - A vec of potentially different parameter generators.
    pub fn new(param_gens: Vec<Box<dyn ParamGen<R>>>) -> Self {
        Self {
            param_gens,
            curr: 0,
        }
    }
}

impl<R: Rng> ParamGen<R> for ChainedParamGen<R> {
    fn sample(&mut self, rng: &mut R, n: usize) -> Option<Vec<f32>> {
        if self.curr == self.param_gens.len() {
            return None;
        }

        match self.param_gens[self.curr].sample(rng, n) {
            Some(sample) if sample.len() == n => Some(sample),
            Some(mut sample) => {
                self.curr += 1;

                if let Some(next_sample) = self.sample(rng, n - sample.len()) {
                    sample.extend(next_sample);
                }

                Some(sample)
            }
            None => {
                self.curr += 1;
                self.sample(rng, n)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, rngs::StdRng};

    use super::{super::ConstParamGen, *};

    #[test]
    fn empty() {
        let mut rng = StdRng::seed_from_u64(0);
        let mut param_gen = ChainedParamGen::<StdRng>::new(vec![]);
        assert!(param_gen.sample(&mut rng, 1).is_none());
    }

    #[test]
    fn exact() {
        let mut rng = StdRng::seed_from_u64(0);
        let param_gens: Vec<Box<dyn ParamGen<StdRng>>> = vec![
            Box::new(ConstParamGen::new(0., 5)),
            Box::new(ConstParamGen::new(1., 5)),
        ];

        let mut param_gen = ChainedParamGen::new(param_gens);
        let sample = param_gen.sample(&mut rng, 10).unwrap();
        let expected: Vec<_> = (0..10).map(|i| (i > 4) as u32 as f32).collect();

        assert_eq!(sample, expected);
        assert!(param_gen.sample(&mut rng, 1).is_none());
    }

    #[test]
    fn recursive() {
        let mut rng = StdRng::seed_from_u64(0);
        let inner: Vec<Box<dyn ParamGen<StdRng>>> = vec![
            Box::new(ConstParamGen::new(1., 1)),
            Box::new(ConstParamGen::new(2., 1)),
        ];

        let param_gens: Vec<Box<dyn ParamGen<StdRng>>> = vec![
            Box::new(ConstParamGen::new(0., 1)),
            Box::new(ChainedParamGen::new(inner)),
            Box::new(ConstParamGen::new(3., 1)),
        ];

        let mut param_gen = ChainedParamGen::new(param_gens);
        let sample = param_gen.sample(&mut rng, 4).unwrap();

        assert_eq!(sample, [0., 1., 2., 3.]);
        assert!(param_gen.sample(&mut rng, 1).is_none());
    }
}
