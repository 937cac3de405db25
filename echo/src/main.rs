use std::{env, fs::File};

use anyhow::{Context, Result};
use env_logger::{Env, Target};
use log::info;
use machine_learning::{
    checkpoint::Checkpoint,
    configs::EchoConfig,
    training::{LogReporter, TrainerBuilder},
};

mod app;
mod state;
mod ui;

/// Where the logs go while the dashboard owns the terminal.
const LOG_FILE: &str = "echo.log";

/// Trains the echo network. The only argument is an optional path to a JSON config.
fn main() -> Result<()> {
    let config = match env::args().nth(1) {
        Some(path) => EchoConfig::from_json_file(&path)
            .with_context(|| format!("cannot load config '{path}'"))?,
        None => EchoConfig::default(),
    };

    init_logging(config.plot)?;
    info!(
        epochs = config.num_epochs,
        windows_per_epoch = config.windows_per_epoch(),
        state_size = config.model.state_size;
        "starting echo training"
    );

    let mut trainer = TrainerBuilder::new().build(&config)?;
    if let Some(path) = config.checkpoint.as_ref().filter(|p| config.resume && p.exists()) {
        let checkpoint = Checkpoint::load(path)
            .with_context(|| format!("cannot load checkpoint '{}'", path.display()))?;
        let params = checkpoint.params(&trainer.model().layout())?;
        trainer.load_params(&params)?;
        info!("restored parameters from {}", path.display());
    }

    let reporter = LogReporter::new(config.report_every, config.sample_every);

    let summary = if config.plot {
        app::run::run(&mut trainer, &config, reporter)?
    } else {
        let mut reporter = reporter;
        trainer.run(&mut reporter)?
    };

    info!(
        epochs = summary.epochs,
        windows = summary.windows,
        interrupted = summary.interrupted;
        "training finished, last loss {:?}",
        summary.last_loss
    );

    if let Some(path) = &config.checkpoint {
        let layout = trainer.model().layout();
        Checkpoint::from_params(&layout, trainer.param_manager().params())?
            .save(path)
            .with_context(|| format!("cannot save checkpoint '{}'", path.display()))?;
        info!("saved parameters to {}", path.display());
    }

    Ok(())
}

fn init_logging(plot: bool) -> Result<()> {
    let mut builder = env_logger::Builder::from_env(Env::default().default_filter_or("info"));

    if plot {
        let file = File::create(LOG_FILE).with_context(|| format!("cannot create '{LOG_FILE}'"))?;
        builder.target(Target::Pipe(Box::new(file)));
    }

    builder.init();
    Ok(())
}
