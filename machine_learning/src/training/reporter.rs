use std::ops::ControlFlow;

use log::info;
use ndarray::Axis;

use super::{Observer, TrainingEvent};

/// Logs the progress of a training run.
#[derive(Debug, Clone)]
pub struct LogReporter {
    report_every: usize,
    sample_every: usize,
}

impl LogReporter {
    /// Creates a new `LogReporter`.
    ///
    /// # Arguments
    /// * `report_every` - Every how many windows of an epoch to log the loss.
    /// * `sample_every` - Every how many windows of an epoch to log the first row's target,
    ///   prediction and state.
    pub fn new(report_every: usize, sample_every: usize) -> Self {
        Self {
            report_every: report_every.max(1),
            sample_every: sample_every.max(1),
        }
    }

    /// Whether the loss of the epoch's `window` gets logged.
    pub fn reports(&self, window: usize) -> bool {
        window % self.report_every == 0
    }

    /// Whether the first row of the epoch's `window` gets logged.
    pub fn samples(&self, window: usize) -> bool {
        window % self.sample_every == 0
    }
}

impl Observer for LogReporter {
    fn notify(&mut self, event: &TrainingEvent<'_>) -> ControlFlow<()> {
        match event {
            TrainingEvent::EpochStarted { epoch } => {
                info!(epoch = *epoch; "new data, epoch {epoch}");
            }
            TrainingEvent::WindowTrained(report) => {
                if self.reports(report.window) {
                    info!(
                        epoch = report.epoch,
                        step = report.window,
                        loss = report.loss;
                        "step {} loss {}",
                        report.window,
                        report.loss
                    );
                }

                if self.samples(report.window) {
                    let answer = report.y.index_axis(Axis(0), 0).to_vec();
                    let prediction = report.predicted_classes().index_axis(Axis(0), 0).to_vec();
                    let state = report.state.index_axis(Axis(0), 0).to_vec();

                    info!("answer {answer:?}");
                    info!("prediction {prediction:?}");
                    info!("state {state:?}");
                }
            }
            TrainingEvent::EpochFinished { epoch, mean_loss } => {
                info!(epoch = *epoch, mean_loss = *mean_loss; "finished epoch {epoch}");
            }
        }

        ControlFlow::Continue(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cadence() {
        let reporter = LogReporter::new(100, 500);
        let reported: Vec<_> = (0..666).filter(|&w| reporter.reports(w)).collect();
        let sampled: Vec<_> = (0..666).filter(|&w| reporter.samples(w)).collect();

        assert_eq!(reported, [0, 100, 200, 300, 400, 500, 600]);
        assert_eq!(sampled, [0, 500]);
    }

    #[test]
    fn zero_means_every_window() {
        let reporter = LogReporter::new(0, 0);
        assert!((0..10).all(|w| reporter.reports(w) && reporter.samples(w)));
    }
}
