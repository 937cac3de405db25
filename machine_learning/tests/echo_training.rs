use std::ops::ControlFlow;

use machine_learning::{
    configs::EchoConfig,
    dataset::echo,
    training::{Observer, TrainerBuilder, TrainingEvent},
};
use ndarray::{Array2, Axis, concatenate};

/// Keeps everything a run reports.
#[derive(Default)]
struct Recorder {
    epochs: Vec<EpochRecord>,
}

#[derive(Default)]
struct EpochRecord {
    xs: Vec<Array2<usize>>,
    ys: Vec<Array2<usize>>,
    init_states: Vec<Array2<f32>>,
    states: Vec<Array2<f32>>,
    losses: Vec<f32>,
    mean_loss: Option<f32>,
}

impl Observer for Recorder {
    fn notify(&mut self, event: &TrainingEvent<'_>) -> ControlFlow<()> {
        match event {
            TrainingEvent::EpochStarted { epoch } => {
                assert_eq!(*epoch, self.epochs.len());
                self.epochs.push(EpochRecord::default());
            }
            TrainingEvent::WindowTrained(report) => {
                let record = self.epochs.last_mut().unwrap();
                assert_eq!(report.window, record.xs.len());

                record.xs.push(report.x.to_owned());
                record.ys.push(report.y.to_owned());
                record.init_states.push(report.init_state.to_owned());
                record.states.push(report.state.to_owned());
                record.losses.push(report.loss);
            }
            TrainingEvent::EpochFinished { mean_loss, .. } => {
                self.epochs.last_mut().unwrap().mean_loss = Some(*mean_loss);
            }
        }

        ControlFlow::Continue(())
    }
}

fn config(num_epochs: usize, seed: u64) -> EchoConfig {
    EchoConfig {
        num_epochs,
        seed: Some(seed),
        plot: false,
        ..Default::default()
    }
}

fn record(config: &EchoConfig) -> Recorder {
    let mut trainer = TrainerBuilder::new().build(config).unwrap();
    let mut recorder = Recorder::default();
    let summary = trainer.run(&mut recorder).unwrap();

    assert!(!summary.interrupted);
    assert_eq!(summary.epochs, config.num_epochs);
    recorder
}

#[test]
fn windows_cover_every_row() {
    let config = EchoConfig {
        total_series_length: 600,
        truncated_backprop_length: 10,
        batch_size: 4,
        ..config(2, 3)
    };

    let recorder = record(&config);

    for epoch in &recorder.epochs {
        // 150 columns, 15 windows of 10 steps
        assert_eq!(epoch.xs.len(), 15);

        let xs: Vec<_> = epoch.xs.iter().map(|x| x.view()).collect();
        let ys: Vec<_> = epoch.ys.iter().map(|y| y.view()).collect();
        let x = concatenate(Axis(1), &xs).unwrap();
        let y = concatenate(Axis(1), &ys).unwrap();
        assert_eq!(x.dim(), (4, 150));

        let sequence: Vec<_> = x.iter().copied().collect();
        let target: Vec<_> = y.iter().copied().collect();
        assert_eq!(target, echo(&sequence, config.echo_step));
    }
}

#[test]
fn state_carries_across_windows() {
    let recorder = record(&EchoConfig {
        total_series_length: 1000,
        ..config(3, 5)
    });

    for epoch in &recorder.epochs {
        assert!(epoch.init_states[0].iter().all(|&h| h == 0.));

        for (last, next) in epoch.states.iter().zip(&epoch.init_states[1..]) {
            assert_eq!(last, next);
        }

        assert!(epoch.states.iter().all(|h| h.dim() == (5, 4)));
    }

    // the state is not all zeros once trained on
    let first = &recorder.epochs[0];
    assert!(first.states[0].iter().any(|&h| h != 0.));
}

#[test]
fn epochs_draw_fresh_series() {
    let recorder = record(&EchoConfig {
        total_series_length: 1000,
        ..config(2, 9)
    });

    assert_ne!(recorder.epochs[0].xs, recorder.epochs[1].xs);
}

#[test]
fn loss_falls_over_epochs() {
    let recorder = record(&config(4, 42));
    let means: Vec<_> = recorder
        .epochs
        .iter()
        .map(|e| e.mean_loss.unwrap())
        .collect();

    for epoch in &recorder.epochs {
        assert_eq!(epoch.losses.len(), 666);
        let mean = epoch.losses.iter().sum::<f32>() / epoch.losses.len() as f32;
        assert!((mean - epoch.mean_loss.unwrap()).abs() < 1e-4);
    }

    // the second epoch may still be on a plateau
    assert!(means[3] < means[0], "{means:?}");
    assert!(means[3] < 0.05, "{means:?}");
}
