use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Rect},
    style::Style,
    text::Text,
    widgets::{Block, Clear, Widget},
};

pub use self::{arena_display::*, stats_panel::*, training_display::*};

mod arena_display;
mod stats_panel;
mod training_display;

pub mod color {
    use ratatui::style::Color;

    pub const GREEN: Color = Color::Rgb(0, 220, 0);
    pub const RED: Color = Color::Rgb(230, 40, 40);
    pub const YELLOW: Color = Color::Rgb(255, 255, 0);
    pub const CYAN: Color = Color::Rgb(0, 255, 255);
    pub const MAGENTA: Color = Color::Rgb(255, 0, 255);
    pub const GRAY: Color = Color::Rgb(127, 127, 127);
    pub const BLACK: Color = Color::Rgb(0, 0, 0);
    pub const WHITE: Color = Color::Rgb(255, 255, 255);
}

pub mod style {
    use ratatui::style::{Color, Style};

    use crate::ui::widgets::color;

    const fn fg_bg(fg: Color, bg: Color) -> Style {
        Style::new().fg(fg).bg(bg)
    }

    pub const DEFAULT: Style = fg_bg(color::WHITE, color::BLACK);
    pub const HELP: Style = Style::new().fg(color::GRAY);
    pub const PAUSED: Style = fg_bg(color::BLACK, color::YELLOW);
    pub const GAME_OVER: Style = fg_bg(color::WHITE, color::RED);
}

/// Session state shown by a screen's border and popup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayState {
    Playing,
    Paused,
    GameOver,
}

impl PlayState {
    pub fn border_color(self, turbo: bool) -> ratatui::style::Color {
        match self {
            PlayState::Playing if turbo => color::MAGENTA,
            PlayState::Playing => color::WHITE,
            PlayState::Paused => color::YELLOW,
            PlayState::GameOver => color::RED,
        }
    }

    /// Overlay text drawn over the arena, if any.
    pub fn popup(self) -> Option<(&'static str, Style)> {
        match self {
            PlayState::Playing => None,
            PlayState::Paused => Some(("PAUSED", style::PAUSED)),
            PlayState::GameOver => Some(("GAME OVER!!", style::GAME_OVER)),
        }
    }
}

/// Draws a one-line banner centered in `area`.
pub fn render_popup(area: Rect, buf: &mut Buffer, text: &str, style: Style) {
    let block = Block::new().style(style);
    let width = u16::try_from(text.len()).unwrap_or(u16::MAX).saturating_add(6);
    let area = area.centered(Constraint::Length(width), Constraint::Length(3));
    let inner = block.inner(area);
    Clear.render(area, buf);
    block.render(area, buf);
    Text::styled(text, style)
        .centered()
        .render(inner.centered_vertically(Constraint::Length(1)), buf);
}
