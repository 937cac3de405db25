use std::ops::ControlFlow;

use ndarray::{Array2, Array3, ArrayView2, Axis};

use super::LossHistory;

/// Something that happened during training.
#[derive(Debug)]
pub enum TrainingEvent<'a> {
    /// A fresh series was drawn and the state was reset.
    EpochStarted { epoch: usize },
    WindowTrained(WindowReport<'a>),
    /// Every window of the epoch was trained on.
    EpochFinished { epoch: usize, mean_loss: f32 },
}

/// The outcome of training on a single window.
#[derive(Debug)]
pub struct WindowReport<'a> {
    pub epoch: usize,
    /// The window's index within its epoch.
    pub window: usize,
    pub windows_per_epoch: usize,
    /// The amount of windows trained on since the run started, this one included.
    pub step: usize,
    pub loss: f32,
    /// `[batch, steps]` input classes.
    pub x: ArrayView2<'a, usize>,
    /// `[batch, steps]` target classes.
    pub y: ArrayView2<'a, usize>,
    /// `[steps, batch, classes]` class probabilities.
    pub predictions: &'a Array3<f32>,
    /// The state the window started from.
    pub init_state: ArrayView2<'a, f32>,
    /// The state after the window's last step.
    pub state: ArrayView2<'a, f32>,
    pub history: &'a LossHistory,
}

impl WindowReport<'_> {
    /// Returns the `[batch, steps]` most probable classes, ties going to the lowest class.
    pub fn predicted_classes(&self) -> Array2<usize> {
        let (steps, batch, _) = self.predictions.dim();

        Array2::from_shape_fn((batch, steps), |(b, t)| {
            let probs = self.predictions.index_axis(Axis(0), t);
            let row = probs.index_axis(Axis(0), b);

            row.iter()
                .enumerate()
                .fold((0, f32::NEG_INFINITY), |(best, max), (c, &p)| {
                    if p > max { (c, p) } else { (best, max) }
                })
                .0
        })
    }
}

/// Watches a training run and decides whether it goes on.
pub trait Observer {
    /// Gets notified of `event`, returning `ControlFlow::Break` stops the run.
    fn notify(&mut self, event: &TrainingEvent<'_>) -> ControlFlow<()>;
}

impl<O: Observer + ?Sized> Observer for &mut O {
    fn notify(&mut self, event: &TrainingEvent<'_>) -> ControlFlow<()> {
        (**self).notify(event)
    }
}

/// Both observers are always notified, the run stops if either asks to.
impl<A: Observer, B: Observer> Observer for (A, B) {
    fn notify(&mut self, event: &TrainingEvent<'_>) -> ControlFlow<()> {
        let a = self.0.notify(event);
        let b = self.1.notify(event);

        match (a, b) {
            (ControlFlow::Continue(()), ControlFlow::Continue(())) => ControlFlow::Continue(()),
            _ => ControlFlow::Break(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use ndarray::{Array2, array};

    use super::*;

    struct StopAt(usize, usize);

    impl Observer for StopAt {
        fn notify(&mut self, _: &TrainingEvent<'_>) -> ControlFlow<()> {
            self.1 += 1;
            if self.1 == self.0 {
                return ControlFlow::Break(());
            }
            ControlFlow::Continue(())
        }
    }

    #[test]
    fn pair_notifies_both() {
        let mut pair = (StopAt(2, 0), StopAt(5, 0));
        let event = TrainingEvent::EpochStarted { epoch: 0 };

        assert!(pair.notify(&event).is_continue());
        assert!(pair.notify(&event).is_break());
        assert_eq!(pair.0.1, 2);
        assert_eq!(pair.1.1, 2);
    }

    #[test]
    fn predicted_classes() {
        // steps = 2, batch = 2, classes = 2
        let predictions = array![[[0.9, 0.1], [0.5, 0.5]], [[0.2, 0.8], [0.4, 0.6]]];
        let x = Array2::<usize>::zeros((2, 2));
        let state = Array2::<f32>::zeros((2, 1));
        let history = LossHistory::new(1);

        let report = WindowReport {
            epoch: 0,
            window: 0,
            windows_per_epoch: 1,
            step: 1,
            loss: 0.,
            x: x.view(),
            y: x.view(),
            predictions: &predictions,
            init_state: state.view(),
            state: state.view(),
            history: &history,
        };

        assert_eq!(report.predicted_classes(), array![[0, 1], [0, 1]]);
    }
}
