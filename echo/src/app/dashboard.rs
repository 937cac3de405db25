use std::{io, ops::ControlFlow};

use machine_learning::training::{Observer, TrainingEvent};
use ratatui::{backend::Backend, Terminal};

use crate::{state::model::DashboardView, ui::draw::draw};

/// Redraws the training progress every `refresh_every` windows and stops the run when asked to.
pub struct Dashboard<'t, B: Backend, K> {
    terminal: &'t mut Terminal<B>,
    quit_requested: K,
    view: DashboardView,
    refresh_every: usize,
    error: Option<io::Error>,
}

impl<'t, B, K> Dashboard<'t, B, K>
where
    B: Backend,
    K: FnMut() -> io::Result<bool>,
{
    /// Creates a new `Dashboard`.
    ///
    /// # Arguments
    /// * `terminal` - The terminal to draw on.
    /// * `quit_requested` - Checks, without blocking, whether the user asked to quit.
    /// * `view` - The initial view.
    /// * `refresh_every` - Every how many windows of an epoch to redraw.
    pub fn new(
        terminal: &'t mut Terminal<B>,
        quit_requested: K,
        view: DashboardView,
        refresh_every: usize,
    ) -> Self {
        Self {
            terminal,
            quit_requested,
            view,
            refresh_every: refresh_every.max(1),
            error: None,
        }
    }

    pub fn view_mut(&mut self) -> &mut DashboardView {
        &mut self.view
    }

    /// Takes the error that stopped the run, if any.
    pub fn take_error(&mut self) -> Option<io::Error> {
        self.error.take()
    }

    pub fn redraw(&mut self) -> io::Result<()> {
        let view = &self.view;
        self.terminal.draw(|f| draw(f, view))?;
        Ok(())
    }

    fn refresh(&mut self) -> io::Result<bool> {
        self.redraw()?;
        (self.quit_requested)()
    }
}

impl<B, K> Observer for Dashboard<'_, B, K>
where
    B: Backend,
    K: FnMut() -> io::Result<bool>,
{
    fn notify(&mut self, event: &TrainingEvent<'_>) -> ControlFlow<()> {
        let refresh = match event {
            TrainingEvent::EpochStarted { epoch } => {
                self.view.start_epoch(*epoch);
                false
            }
            TrainingEvent::WindowTrained(report) => {
                let due = report.window % self.refresh_every == 0;
                if due {
                    self.view.update(report);
                }
                due
            }
            TrainingEvent::EpochFinished { mean_loss, .. } => {
                self.view.finish_epoch(*mean_loss);
                true
            }
        };

        if !refresh {
            return ControlFlow::Continue(());
        }

        match self.refresh() {
            Ok(false) => ControlFlow::Continue(()),
            Ok(true) => ControlFlow::Break(()),
            Err(e) => {
                self.error = Some(e);
                ControlFlow::Break(())
            }
        }
    }
}
