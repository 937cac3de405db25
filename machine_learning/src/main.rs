use std::{env, path::Path};

use anyhow::{Context, Result};
use log::info;
use machine_learning::{
    arch::{Model, Sequential, layers::Dense, loss::Mse},
    checkpoint::Checkpoint,
    configs::ParamGenConfig,
    initialization::ChainedParamGen,
    optimization::Adam,
    training::{ParamManager, TrainerBuilder},
};
use ndarray::{Array2, array};
use rand::{SeedableRng, rngs::StdRng};

const CHECKPOINT: &str = "brains/regression.json";
const ITERATIONS: usize = 100;
const LEARNING_RATE: f32 = 0.1;

/// Fits `y = x` with a single linear unit. Pass `--resume` to start from the last checkpoint.
fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let resume = env::args().skip(1).any(|arg| arg == "--resume");

    let x = array![[0.], [1.], [2.]];
    let y = x.clone();
    let unseen = array![[5.], [75.], [2500.]];

    let mut model = Sequential::new([Dense::new((1, 1), None)]);
    let mut param_manager = init_params(&model)?;

    if resume && Path::new(CHECKPOINT).exists() {
        restore(&mut param_manager).context("failed to restore the checkpoint")?;
        info!("restored parameters from {CHECKPOINT}");
    }

    info!("initial network [weight, bias]: {:?}", param_manager.params());

    let mut optimizer = Adam::with_learning_rate(model.size(), LEARNING_RATE);
    for i in 0..ITERATIONS {
        let outputs = model.forward(&param_manager, x.view())?;
        let loss = model.backprop(
            &mut param_manager,
            &mut optimizer,
            &Mse,
            [(x.view(), y.view())],
        )?;

        info!(iteration = i, loss = loss; "outputs {:?}", column(&outputs));
    }

    let outputs = model.forward(&param_manager, x.view())?;
    info!("final outputs for {:?}: {:?}", column(&x), column(&outputs));

    let outputs = model.forward(&param_manager, unseen.view())?;
    info!(
        "outputs for unseen inputs {:?}: {:?}",
        column(&unseen),
        column(&outputs)
    );

    info!("final network [weight, bias]: {:?}", param_manager.params());

    save(&param_manager).context("failed to save the checkpoint")?;
    info!("saved parameters to {CHECKPOINT}");
    Ok(())
}

/// Xavier uniform weight, zero bias.
fn init_params(model: &Sequential) -> Result<ParamManager> {
    let builder = TrainerBuilder::new();
    let mut rng = StdRng::from_os_rng();

    let mut param_gen = ChainedParamGen::new(vec![
        builder.resolve_init(ParamGenConfig::XavierUniform, 1, 1, 1)?,
        builder.resolve_init(ParamGenConfig::Const { value: 0. }, 1, 1, 1)?,
    ]);

    Ok(ParamManager::generate(model, &mut param_gen, &mut rng)?)
}

fn layout() -> Vec<(&'static str, Vec<usize>)> {
    vec![("dense/kernel", vec![1, 1]), ("dense/bias", vec![1])]
}

fn save(param_manager: &ParamManager) -> Result<()> {
    Checkpoint::from_params(&layout(), param_manager.params())?.save(CHECKPOINT)?;
    Ok(())
}

fn restore(param_manager: &mut ParamManager) -> Result<()> {
    let checkpoint = Checkpoint::load(CHECKPOINT)?;
    param_manager.load(&checkpoint.params(&layout())?)?;
    Ok(())
}

fn column(a: &Array2<f32>) -> Vec<f32> {
    a.column(0).to_vec()
}
