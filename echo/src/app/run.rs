use std::{io, time::Duration};

use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use machine_learning::{
    configs::EchoConfig,
    training::{EchoTrainer, LogReporter, TrainingSummary},
};
use rand::Rng;
use ratatui::{backend::CrosstermBackend, Terminal};

use super::dashboard::Dashboard;
use crate::state::model::DashboardView;

struct TerminalGuard;

impl TerminalGuard {
    fn enter() -> Result<Self> {
        enable_raw_mode()?;
        execute!(io::stdout(), EnterAlternateScreen)?;
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
    }
}

/// Trains while showing the dashboard. Once the run finishes the last frame stays up until the
/// user quits.
///
/// # Errors
/// Returns an error if terminal setup, rendering or training fails.
pub fn run<R: Rng>(
    trainer: &mut EchoTrainer<R>,
    config: &EchoConfig,
    reporter: LogReporter,
) -> Result<TrainingSummary> {
    let _guard = TerminalGuard::enter()?;

    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    let view = DashboardView::new(config);
    let mut dashboard = Dashboard::new(
        &mut terminal,
        || quit_requested(Duration::ZERO),
        view,
        config.report_every,
    );

    let summary = trainer.run(&mut (&mut dashboard, reporter))?;
    if let Some(e) = dashboard.take_error() {
        return Err(e.into());
    }

    dashboard.view_mut().finish(&summary);
    dashboard.redraw()?;

    if !summary.interrupted {
        while !quit_requested(Duration::from_millis(120))? {}
    }

    terminal.show_cursor()?;
    Ok(summary)
}

/// Waits up to `timeout` for a key press, returning whether it was `q` or `Esc`.
fn quit_requested(timeout: Duration) -> io::Result<bool> {
    if !event::poll(timeout)? {
        return Ok(false);
    }

    match event::read()? {
        Event::Key(k) if k.kind == KeyEventKind::Press => {
            Ok(matches!(k.code, KeyCode::Char('q') | KeyCode::Esc))
        }
        _ => Ok(false),
    }
}
