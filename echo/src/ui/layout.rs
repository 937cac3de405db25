use ratatui::layout::{Constraint, Direction, Layout, Rect};

/// Label column width of the strips.
const LABEL_WIDTH: u16 = 12;

/// Computes the main layout regions.
///
/// # Returns
/// (header, chart, rows)
pub fn vertical(area: Rect) -> (Rect, Rect, Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4),
            Constraint::Percentage(40),
            Constraint::Min(8),
        ])
        .split(area);

    (chunks[0], chunks[1], chunks[2])
}

/// Splits the rows panel into one region per batch row.
pub fn rows(area: Rect, nrows: usize) -> Vec<Rect> {
    if nrows == 0 {
        return Vec::new();
    }

    let constraints = vec![Constraint::Ratio(1, nrows as u32); nrows];
    Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(area)
        .to_vec()
}

/// Splits a row region into its input, target and prediction strips, each as (label, bars).
pub fn strips(area: Rect) -> [(Rect, Rect); 3] {
    let lines = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(area);

    [0, 1, 2].map(|i| {
        let cols = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(LABEL_WIDTH), Constraint::Min(1)])
            .split(lines[i]);

        (cols[0], cols[1])
    })
}
