use rand::{SeedableRng, rngs::StdRng};

use super::{EchoTrainer, ParamManager};
use crate::{
    MlErr, Result,
    arch::{EchoRnn, Model, activations::ActFn},
    configs::{ActFnConfig, EchoConfig, OptimizerConfig, ParamGenConfig},
    dataset::EchoGenerator,
    initialization::{ChainedParamGen, ConstParamGen, ParamGen, RandParamGen},
    optimization::{Adagrad, Adam, GradientDescent, Optimizer},
};

/// Builds `EchoTrainer`s given a configuration.
#[derive(Default)]
pub struct TrainerBuilder;

impl TrainerBuilder {
    /// Creates a new `TrainerBuilder`.
    pub fn new() -> Self {
        Self
    }

    /// Builds a new `EchoTrainer` following a configuration.
    ///
    /// # Arguments
    /// * `config` - The configuration of the training run.
    ///
    /// # Returns
    /// The trainer, with freshly initialized parameters, or an error if the configuration is
    /// invalid.
    pub fn build(&self, config: &EchoConfig) -> Result<EchoTrainer<StdRng>> {
        config.validate()?;

        let mut rng = self.generate_rng(config.seed);
        let model = self.resolve_model(config);

        let mut param_gen = self.resolve_param_gen(config, &model)?;
        let param_manager = ParamManager::generate(&model, &mut param_gen, &mut rng)?;
        let optimizer = self.resolve_optimizer(config.optimizer, model.size());
        let generator = self.resolve_generator(config)?;

        Ok(EchoTrainer::new(
            model,
            param_manager,
            optimizer,
            generator,
            config.model.input_encoding,
            config.truncated_backprop_length,
            config.num_epochs,
            config.history_len,
            rng,
        ))
    }

    fn resolve_model(&self, config: &EchoConfig) -> EchoRnn {
        let input_size = config.model.input_encoding.width(config.num_classes);
        let act_fn = self.resolve_act_fn(config.model.activation);

        EchoRnn::new(
            input_size,
            config.model.state_size,
            config.num_classes,
            act_fn,
        )
    }

    fn resolve_act_fn(&self, config: ActFnConfig) -> ActFn {
        match config {
            ActFnConfig::Tanh => ActFn::tanh(),
            ActFnConfig::Sigmoid { amp } => ActFn::sigmoid(amp),
        }
    }

    /// Chains one generator per parameter section: the cell's weights and biases, then the
    /// decoder's weights and biases.
    fn resolve_param_gen(
        &self,
        config: &EchoConfig,
        model: &EchoRnn,
    ) -> Result<ChainedParamGen<StdRng>> {
        let (n, s, c) = (model.input_size(), model.state_size(), model.num_classes());
        let (weight_init, bias_init) = (config.model.weight_init, config.model.bias_init);

        let param_gens = vec![
            self.resolve_init(weight_init, (n + s) * s, n + s, s)?,
            self.resolve_init(bias_init, s, n + s, s)?,
            self.resolve_init(weight_init, s * c, s, c)?,
            self.resolve_init(bias_init, c, s, c)?,
        ];

        Ok(ChainedParamGen::new(param_gens))
    }

    /// Resolves the generator of a single section of `limit` parameters.
    pub fn resolve_init(
        &self,
        config: ParamGenConfig,
        limit: usize,
        fan_in: usize,
        fan_out: usize,
    ) -> Result<Box<dyn ParamGen<StdRng>>> {
        let invalid = |e: &dyn std::fmt::Display| MlErr::InvalidConfig(format!("{config:?}: {e}"));

        let param_gen: Box<dyn ParamGen<StdRng>> = match config {
            ParamGenConfig::Const { value } => Box::new(ConstParamGen::new(value, limit)),
            ParamGenConfig::Uniform { low, high } => Box::new(
                RandParamGen::uniform(limit, low, high).map_err(|e| invalid(&e))?,
            ),
            ParamGenConfig::UniformInclusive { low, high } => Box::new(
                RandParamGen::uniform_inclusive(limit, low, high).map_err(|e| invalid(&e))?,
            ),
            ParamGenConfig::XavierUniform => Box::new(
                RandParamGen::xavier_uniform(limit, fan_in, fan_out).map_err(|e| invalid(&e))?,
            ),
            ParamGenConfig::Normal { mean, std_dev } => Box::new(
                RandParamGen::normal(limit, mean, std_dev).map_err(|e| invalid(&e))?,
            ),
        };

        Ok(param_gen)
    }

    /// Resolves the optimizer of a model with `len` parameters.
    pub fn resolve_optimizer(&self, config: OptimizerConfig, len: usize) -> Box<dyn Optimizer> {
        match config {
            OptimizerConfig::Adagrad {
                lr,
                initial_accumulator,
            } => Box::new(Adagrad::new(len, lr, initial_accumulator)),
            OptimizerConfig::Adam { lr, b1, b2, eps } => Box::new(Adam::new(len, lr, b1, b2, eps)),
            OptimizerConfig::GradientDescent { lr } => Box::new(GradientDescent::new(lr)),
        }
    }

    fn resolve_generator(&self, config: &EchoConfig) -> Result<EchoGenerator> {
        let generator = EchoGenerator::new(
            config.total_series_length,
            config.batch_size,
            config.echo_step,
            config.num_classes,
        )?;

        match &config.class_weights {
            Some(weights) => generator.with_class_weights(weights),
            None => Ok(generator),
        }
    }

    fn generate_rng(&self, seed: Option<u64>) -> StdRng {
        match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        }
    }
}
