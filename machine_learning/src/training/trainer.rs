use std::ops::ControlFlow;

use log::debug;
use ndarray::{Array2, ArrayView2};
use rand::Rng;

use super::{LossHistory, Observer, ParamManager, TrainingEvent, WindowReport};
use crate::{
    Result,
    arch::{EchoRnn, loss::SoftmaxCrossEntropy},
    dataset::{EchoGenerator, EchoSeries, InputEncoding},
    optimization::Optimizer,
};

/// Where an `EchoTrainer` stands in its run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    EpochStart,
    WindowIteration,
    EpochEnd,
    Finished,
}

/// What a training run went through.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrainingSummary {
    /// The amount of epochs fully trained on.
    pub epochs: usize,
    pub windows: usize,
    pub last_loss: Option<f32>,
    /// Whether an observer stopped the run early.
    pub interrupted: bool,
}

/// Trains an `EchoRnn` with truncated backpropagation through time.
///
/// Every epoch draws a fresh series and walks its windows in order, carrying the state from one
/// window into the next. The state is reset to zeros at the start of every epoch.
pub struct EchoTrainer<R: Rng> {
    model: EchoRnn,
    param_manager: ParamManager,
    optimizer: Box<dyn Optimizer>,
    loss_fn: SoftmaxCrossEntropy,
    generator: EchoGenerator,
    encoding: InputEncoding,
    window_len: usize,
    num_epochs: usize,
    rng: R,

    phase: Phase,
    series: Option<EchoSeries>,
    state: Array2<f32>,
    history: LossHistory,
    epoch: usize,
    window: usize,
    step: usize,
    epoch_loss: f32,
    last_loss: Option<f32>,
    interrupted: bool,
}

impl<R: Rng> EchoTrainer<R> {
    /// Creates a new `EchoTrainer`.
    ///
    /// # Arguments
    /// * `model` - The network to train.
    /// * `param_manager` - The manager of the network's parameters.
    /// * `optimizer` - The optimizer applied after every window.
    /// * `generator` - The source of each epoch's series.
    /// * `encoding` - How the inputs are fed to the network.
    /// * `window_len` - The amount of steps backpropagated through.
    /// * `num_epochs` - The amount of epochs to train for.
    /// * `history_len` - The amount of window losses to keep.
    /// * `rng` - A random number generator.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        model: EchoRnn,
        param_manager: ParamManager,
        optimizer: Box<dyn Optimizer>,
        generator: EchoGenerator,
        encoding: InputEncoding,
        window_len: usize,
        num_epochs: usize,
        history_len: usize,
        rng: R,
    ) -> Self {
        let state = Array2::zeros((generator.batch_size(), model.state_size()));

        Self {
            model,
            param_manager,
            optimizer,
            loss_fn: SoftmaxCrossEntropy::new(),
            generator,
            encoding,
            window_len,
            num_epochs,
            rng,
            phase: Phase::EpochStart,
            series: None,
            state,
            history: LossHistory::new(history_len),
            epoch: 0,
            window: 0,
            step: 0,
            epoch_loss: 0.,
            last_loss: None,
            interrupted: false,
        }
    }

    /// Runs the remaining of the training, notifying `observer` of every event.
    pub fn run<O: Observer + ?Sized>(&mut self, observer: &mut O) -> Result<TrainingSummary> {
        while self.phase != Phase::Finished {
            if self.advance(observer)?.is_break() {
                debug!(epoch = self.epoch, step = self.step; "training interrupted");
                self.interrupted = true;
                self.phase = Phase::Finished;
            }
        }

        Ok(self.summary())
    }

    /// Makes a single transition of the training state machine.
    ///
    /// # Returns
    /// Whether `observer` asked to stop, or an error if the window couldn't be trained on.
    pub fn advance<O: Observer + ?Sized>(&mut self, observer: &mut O) -> Result<ControlFlow<()>> {
        match self.phase {
            Phase::EpochStart => self.start_epoch(observer),
            Phase::WindowIteration => self.train_window(observer),
            Phase::EpochEnd => Ok(self.end_epoch(observer)),
            Phase::Finished => Ok(ControlFlow::Continue(())),
        }
    }

    fn start_epoch<O: Observer + ?Sized>(&mut self, observer: &mut O) -> Result<ControlFlow<()>> {
        if self.epoch >= self.num_epochs {
            self.phase = Phase::Finished;
            return Ok(ControlFlow::Continue(()));
        }

        self.series = Some(self.generator.generate(&mut self.rng)?);
        self.state.fill(0.);
        self.window = 0;
        self.epoch_loss = 0.;
        self.phase = Phase::WindowIteration;

        Ok(observer.notify(&TrainingEvent::EpochStarted { epoch: self.epoch }))
    }

    fn train_window<O: Observer + ?Sized>(&mut self, observer: &mut O) -> Result<ControlFlow<()>> {
        let Some(series) = &self.series else {
            self.phase = Phase::EpochEnd;
            return Ok(ControlFlow::Continue(()));
        };

        let Some(window) = series.window(self.window_len, self.window) else {
            self.phase = Phase::EpochEnd;
            return Ok(ControlFlow::Continue(()));
        };

        let num_classes = self.model.num_classes();
        let inputs = window.inputs(self.encoding, num_classes);
        let targets = window.targets(num_classes);

        let trained = self.model.train_window(
            &mut self.param_manager,
            self.optimizer.as_mut(),
            &self.loss_fn,
            inputs.view(),
            targets.view(),
            self.state.view(),
        )?;

        let init_state = std::mem::replace(&mut self.state, trained.last_state);
        self.history.push(trained.loss);
        self.epoch_loss += trained.loss;
        self.last_loss = Some(trained.loss);
        self.step += 1;

        let report = WindowReport {
            epoch: self.epoch,
            window: self.window,
            windows_per_epoch: series.window_count(self.window_len),
            step: self.step,
            loss: trained.loss,
            x: window.x,
            y: window.y,
            predictions: &trained.predictions,
            init_state: init_state.view(),
            state: self.state.view(),
            history: &self.history,
        };

        let flow = observer.notify(&TrainingEvent::WindowTrained(report));
        self.window += 1;
        Ok(flow)
    }

    fn end_epoch<O: Observer + ?Sized>(&mut self, observer: &mut O) -> ControlFlow<()> {
        let mean_loss = match self.window {
            0 => 0.,
            n => self.epoch_loss / n as f32,
        };

        let flow = observer.notify(&TrainingEvent::EpochFinished {
            epoch: self.epoch,
            mean_loss,
        });

        self.epoch += 1;
        self.phase = if self.epoch < self.num_epochs {
            Phase::EpochStart
        } else {
            Phase::Finished
        };

        flow
    }

    pub fn summary(&self) -> TrainingSummary {
        TrainingSummary {
            epochs: self.epoch,
            windows: self.step,
            last_loss: self.last_loss,
            interrupted: self.interrupted,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Returns the state the next window will start from.
    pub fn state(&self) -> ArrayView2<'_, f32> {
        self.state.view()
    }

    pub fn history(&self) -> &LossHistory {
        &self.history
    }

    pub fn model(&self) -> &EchoRnn {
        &self.model
    }

    pub fn param_manager(&self) -> &ParamManager {
        &self.param_manager
    }

    /// Overwrites the network's parameters with `values`.
    pub fn load_params(&mut self, values: &[f32]) -> Result<()> {
        self.param_manager.load(values)
    }
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;
    use crate::{
        arch::{Model, activations::ActFn},
        checkpoint::Checkpoint,
        initialization::ConstParamGen,
        optimization::GradientDescent,
    };

    struct Recorder {
        events: Vec<String>,
        stop_after: Option<usize>,
    }

    impl Observer for Recorder {
        fn notify(&mut self, event: &TrainingEvent<'_>) -> ControlFlow<()> {
            let name = match event {
                TrainingEvent::EpochStarted { epoch } => format!("start {epoch}"),
                TrainingEvent::WindowTrained(r) => format!("window {} {}", r.epoch, r.window),
                TrainingEvent::EpochFinished { epoch, .. } => format!("end {epoch}"),
            };
            self.events.push(name);

            match self.stop_after {
                Some(n) if self.events.len() >= n => ControlFlow::Break(()),
                _ => ControlFlow::Continue(()),
            }
        }
    }

    fn trainer(num_epochs: usize) -> EchoTrainer<StdRng> {
        let mut rng = StdRng::seed_from_u64(1);
        let model = EchoRnn::new(1, 3, 2, ActFn::tanh());
        let mut param_gen = ConstParamGen::new(0.1, model.size());
        let param_manager = ParamManager::generate(&model, &mut param_gen, &mut rng).unwrap();
        let generator = EchoGenerator::new(40, 2, 1, 2).unwrap();

        EchoTrainer::new(
            model,
            param_manager,
            Box::new(GradientDescent::new(0.1)),
            generator,
            InputEncoding::Scalar,
            6,
            num_epochs,
            5,
            rng,
        )
    }

    #[test]
    fn phases() {
        let mut trainer = trainer(2);
        let mut recorder = Recorder {
            events: Vec::new(),
            stop_after: None,
        };

        assert_eq!(trainer.phase(), Phase::EpochStart);
        trainer.advance(&mut recorder).unwrap();
        assert_eq!(trainer.phase(), Phase::WindowIteration);

        let summary = trainer.run(&mut recorder).unwrap();

        // 20 columns, 3 windows of 6 steps per epoch
        let expected = [
            "start 0", "window 0 0", "window 0 1", "window 0 2", "end 0", "start 1", "window 1 0",
            "window 1 1", "window 1 2", "end 1",
        ];
        assert_eq!(recorder.events, expected);
        assert_eq!(trainer.phase(), Phase::Finished);
        assert_eq!(
            summary,
            TrainingSummary {
                epochs: 2,
                windows: 6,
                last_loss: trainer.history().last(),
                interrupted: false,
            }
        );
        assert_eq!(trainer.history().len(), 5);
    }

    #[test]
    fn observer_stops_the_run() {
        let mut trainer = trainer(10);
        let mut recorder = Recorder {
            events: Vec::new(),
            stop_after: Some(3),
        };

        let summary = trainer.run(&mut recorder).unwrap();

        assert!(summary.interrupted);
        assert_eq!(summary.epochs, 0);
        assert_eq!(summary.windows, 2);
        assert_eq!(trainer.phase(), Phase::Finished);
    }

    #[test]
    fn no_epochs() {
        let mut trainer = trainer(0);
        let mut recorder = Recorder {
            events: Vec::new(),
            stop_after: None,
        };

        let summary = trainer.run(&mut recorder).unwrap();

        assert!(recorder.events.is_empty());
        assert_eq!(summary.windows, 0);
        assert_eq!(summary.last_loss, None);
    }

    #[test]
    fn resumes_from_checkpoint() {
        let mut trained = trainer(1);
        let mut recorder = Recorder {
            events: Vec::new(),
            stop_after: None,
        };
        trained.run(&mut recorder).unwrap();

        let layout = trained.model().layout();
        let checkpoint = Checkpoint::from_params(&layout, trained.param_manager().params()).unwrap();

        let mut fresh = trainer(1);
        assert_ne!(fresh.param_manager().params(), trained.param_manager().params());

        fresh.load_params(&checkpoint.params(&layout).unwrap()).unwrap();
        assert_eq!(fresh.param_manager().params(), trained.param_manager().params());
        assert!(fresh.load_params(&[0.; 3]).is_err());
    }
}
