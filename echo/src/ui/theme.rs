use ratatui::style::{Color, Modifier, Style};

const BLACK: Color = Color::Rgb(0, 0, 0);
const GREEN: Color = Color::Rgb(57, 255, 20);
const DARK_GREEN: Color = Color::Rgb(0, 190, 0);
const GREY: Color = Color::Rgb(80, 90, 80);
const CYAN: Color = Color::Rgb(0, 255, 255);
const MAGENTA: Color = Color::Rgb(255, 0, 255);
const YELLOW: Color = Color::Rgb(255, 255, 0);

/// The dashboard's styles, green on black.
pub struct Theme;

impl Theme {
    pub fn base() -> Style {
        Style::default().fg(GREEN).bg(BLACK)
    }

    pub fn border() -> Style {
        Self::base()
    }

    pub fn title() -> Style {
        Style::default().fg(GREEN).add_modifier(Modifier::BOLD)
    }

    pub fn text() -> Style {
        Style::default().fg(GREEN)
    }

    /// Strip labels.
    pub fn dim() -> Style {
        Style::default().fg(DARK_GREEN)
    }

    /// Chart axes.
    pub fn muted() -> Style {
        Style::default().fg(GREY)
    }

    pub fn warn() -> Style {
        Style::default().fg(YELLOW).add_modifier(Modifier::BOLD)
    }

    pub fn input() -> Style {
        Style::default().fg(CYAN)
    }

    pub fn target() -> Style {
        Self::text()
    }

    pub fn prediction() -> Style {
        Style::default().fg(MAGENTA)
    }
}
