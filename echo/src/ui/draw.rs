use ratatui::{widgets::Block, Frame};

use super::{layout, theme::Theme, widgets};
use crate::state::model::DashboardView;

/// Draws the entire UI.
pub fn draw(f: &mut Frame, view: &DashboardView) {
    let area = f.size();
    f.render_widget(Block::default().style(Theme::base()), area);

    let (header_area, chart_area, rows_area) = layout::vertical(area);

    f.render_widget(widgets::header(view), header_area);
    f.render_widget(widgets::loss_chart(view), chart_area);

    let panel = widgets::panel("Batch rows: input / target / prediction");
    let inner = panel.inner(rows_area);
    f.render_widget(panel, rows_area);

    for (i, (row, area)) in view
        .rows
        .iter()
        .zip(layout::rows(inner, view.rows.len()))
        .enumerate()
    {
        let strips = [
            ("input", &row.input, Theme::input()),
            ("target", &row.target, Theme::target()),
            ("prediction", &row.prediction, Theme::prediction()),
        ];

        for ((label_area, bars_area), (name, values, style)) in
            layout::strips(area).into_iter().zip(strips)
        {
            let label = match name {
                "input" => format!("{i}: {name}"),
                _ => format!("   {name}"),
            };

            let data = widgets::widen(values, bars_area.width);
            f.render_widget(widgets::label(&label), label_area);
            f.render_widget(
                widgets::strip(&data, view.num_classes).style(style),
                bars_area,
            );
        }
    }
}
