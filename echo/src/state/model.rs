use machine_learning::{
    configs::EchoConfig,
    training::{TrainingSummary, WindowReport},
};
use ndarray::{ArrayView1, Axis};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    Training,
    Finished,
    Interrupted,
}

/// The classes of a single batch row over the last drawn window.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowView {
    pub input: Vec<u64>,
    pub target: Vec<u64>,
    pub prediction: Vec<u64>,
}

/// Everything the dashboard shows, as of the last refresh.
#[derive(Debug, Clone)]
pub struct DashboardView {
    pub phase: RunPhase,
    pub epoch: usize,
    pub num_epochs: usize,
    pub window: usize,
    pub windows_per_epoch: usize,
    pub step: usize,
    pub loss: Option<f32>,
    pub last_epoch_loss: Option<f32>,
    pub num_classes: usize,
    /// `(index, loss)` points of the loss history.
    pub losses: Vec<(f64, f64)>,
    pub loss_bounds: (f64, f64),
    pub rows: Vec<RowView>,
}

impl DashboardView {
    pub fn new(config: &EchoConfig) -> Self {
        Self {
            phase: RunPhase::Training,
            epoch: 0,
            num_epochs: config.num_epochs,
            window: 0,
            windows_per_epoch: config.windows_per_epoch(),
            step: 0,
            loss: None,
            last_epoch_loss: None,
            num_classes: config.num_classes,
            losses: Vec::new(),
            loss_bounds: (0., 1.),
            rows: vec![RowView::default(); config.batch_size],
        }
    }

    pub fn start_epoch(&mut self, epoch: usize) {
        self.epoch = epoch;
        self.window = 0;
    }

    pub fn finish_epoch(&mut self, mean_loss: f32) {
        self.last_epoch_loss = Some(mean_loss);
    }

    pub fn finish(&mut self, summary: &TrainingSummary) {
        self.phase = if summary.interrupted {
            RunPhase::Interrupted
        } else {
            RunPhase::Finished
        };
    }

    /// Takes a snapshot of `report`.
    pub fn update(&mut self, report: &WindowReport<'_>) {
        self.epoch = report.epoch;
        self.window = report.window;
        self.windows_per_epoch = report.windows_per_epoch;
        self.step = report.step;
        self.loss = Some(report.loss);

        self.losses = report
            .history
            .iter()
            .enumerate()
            .map(|(i, &loss)| (i as f64, loss as f64))
            .collect();

        self.loss_bounds = report
            .history
            .bounds()
            .map(|(lo, hi)| (lo as f64, hi as f64))
            .unwrap_or((0., 1.));

        let predicted = report.predicted_classes();
        self.rows = report
            .x
            .axis_iter(Axis(0))
            .zip(report.y.axis_iter(Axis(0)))
            .zip(predicted.axis_iter(Axis(0)))
            .map(|((input, target), prediction)| RowView {
                input: classes(input),
                target: classes(target),
                prediction: classes(prediction),
            })
            .collect();
    }
}

fn classes(row: ArrayView1<usize>) -> Vec<u64> {
    row.iter().map(|&c| c as u64).collect()
}
