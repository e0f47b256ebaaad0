use horde_engine::{EpisodeState, WorldConfig};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Padding, Paragraph, Widget},
};

use crate::ui::widgets::{color, style};

/// Label/value rows in a bordered box.
#[derive(Debug)]
pub struct StatsPanel<'a> {
    rows: Vec<Line<'a>>,
    title: &'a str,
    border: ratatui::style::Color,
}

impl<'a> StatsPanel<'a> {
    pub fn new(title: &'a str) -> Self {
        Self {
            rows: vec![],
            title,
            border: color::WHITE,
        }
    }

    /// Standard rows describing the live episode.
    pub fn episode(title: &'a str, episode: &EpisodeState, config: &WorldConfig) -> Self {
        let phase = config
            .phases
            .get(episode.phase())
            .map_or("-", |phase| phase.name.as_str())
            .to_owned();
        let health = usize::from(episode.health());
        let lost = usize::from(config.max_health).saturating_sub(health);
        let hearts = Line::from(vec![
            Span::raw(format!("{:<8}", "HEALTH:")),
            Span::styled("♥".repeat(health), Style::new().fg(color::RED)),
            Span::styled("♡".repeat(lost), Style::new().fg(color::GRAY)),
        ]);
        let mut panel = Self::new(title);
        panel.rows.push(hearts);
        panel
            .row("SCORE:", episode.score().to_string())
            .row("PHASE:", phase)
            .row("TIME:", format!("{:.1}s", episode.elapsed().as_secs_f64()))
            .row("TICK:", episode.ticks().to_string())
            .row("ZOMBIES:", episode.zombies().len().to_string())
    }

    pub fn row(mut self, label: &str, value: impl Into<String>) -> Self {
        self.rows
            .push(Line::from(format!("{label:<8}{:>9}", value.into())));
        self
    }

    pub fn blank(mut self) -> Self {
        self.rows.push(Line::default());
        self
    }

    pub fn border(self, border: ratatui::style::Color) -> Self {
        Self { border, ..self }
    }

    pub fn height(&self) -> u16 {
        u16::try_from(self.rows.len()).unwrap_or(u16::MAX).saturating_add(2)
    }
}

impl Widget for StatsPanel<'_> {
    fn render(self, area: Rect, buf: &mut Buffer)
    where
        Self: Sized,
    {
        let block = Block::bordered()
            .title(Line::from(self.title).centered())
            .padding(Padding::horizontal(1))
            .border_style(self.border)
            .style(style::DEFAULT);
        Paragraph::new(self.rows).block(block).render(area, buf);
    }
}
