use ratatui::{
    symbols::Marker,
    text::{Line, Span},
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType, Paragraph, Sparkline, Wrap},
};

use super::theme::Theme;
use crate::state::model::{DashboardView, RunPhase};

pub fn header(view: &DashboardView) -> Paragraph<'_> {
    let phase = match view.phase {
        RunPhase::Training => Span::styled("TRAINING", Theme::title()),
        RunPhase::Finished => Span::styled("FINISHED  (q to quit)", Theme::title()),
        RunPhase::Interrupted => Span::styled("INTERRUPTED", Theme::warn()),
    };

    let loss = view
        .loss
        .map_or_else(|| "-".to_string(), |l| format!("{l:.4}"));
    let epoch_loss = view
        .last_epoch_loss
        .map_or_else(|| "-".to_string(), |l| format!("{l:.4}"));

    let line1 = Line::from(vec![
        Span::styled("Echo RNN", Theme::title()),
        Span::raw("  |  "),
        phase,
    ]);

    let line2 = Line::from(vec![Span::styled(
        format!(
            "Epoch: {} / {}  |  Window: {} / {}  |  Step: {}  |  Loss: {loss}  |  Last epoch: {epoch_loss}",
            view.epoch + 1,
            view.num_epochs,
            view.window + 1,
            view.windows_per_epoch,
            view.step,
        ),
        Theme::text(),
    )]);

    Paragraph::new(vec![line1, line2])
        .block(panel("Overview"))
        .wrap(Wrap { trim: true })
}

pub fn loss_chart(view: &DashboardView) -> Chart<'_> {
    let (lo, hi) = view.loss_bounds;
    let pad = ((hi - lo) * 0.05).max(1e-3);
    let (lo, hi) = ((lo - pad).max(0.), hi + pad);
    let len = view.losses.len().max(2) as f64 - 1.;

    let dataset = Dataset::default()
        .name("loss")
        .marker(Marker::Braille)
        .graph_type(GraphType::Line)
        .style(Theme::text())
        .data(&view.losses);

    Chart::new(vec![dataset])
        .block(panel("Loss"))
        .x_axis(
            Axis::default()
                .style(Theme::muted())
                .bounds([0., len])
                .labels(vec![Span::raw("0"), Span::raw(format!("{len}"))]),
        )
        .y_axis(
            Axis::default()
                .style(Theme::muted())
                .bounds([lo, hi])
                .labels(vec![
                    Span::raw(format!("{lo:.3}")),
                    Span::raw(format!("{hi:.3}")),
                ]),
        )
}

/// A single-line strip of class bars, the tallest bar being the last class.
pub fn strip<'a>(data: &'a [u64], num_classes: usize) -> Sparkline<'a> {
    Sparkline::default()
        .data(data)
        .max(num_classes.saturating_sub(1).max(1) as u64)
}

pub fn label(text: &str) -> Paragraph<'_> {
    Paragraph::new(Span::styled(text, Theme::dim()))
}

pub fn panel(title: &str) -> Block<'_> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(Theme::border())
        .title(Span::styled(title, Theme::title()))
}

/// Repeats every value so that `values` spans `width` columns.
pub fn widen(values: &[u64], width: u16) -> Vec<u64> {
    if values.is_empty() {
        return Vec::new();
    }

    let times = (width as usize / values.len()).max(1);
    values
        .iter()
        .flat_map(|&v| std::iter::repeat(v).take(times))
        .collect()
}
