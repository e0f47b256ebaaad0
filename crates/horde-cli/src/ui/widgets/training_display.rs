use horde_training::{EpisodeRecord, RewardStats};
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Layout, Rect},
    style::Style,
    text::Line,
    widgets::{Block, Gauge, Sparkline, Widget},
};

use crate::ui::widgets::{StatsPanel, color, style};

/// Live view of a training run: progress bar, reward history and summary.
#[derive(Debug)]
pub struct TrainingDisplay<'a> {
    records: &'a [EpisodeRecord],
    episodes_target: u64,
    window: usize,
    checkpoint: &'a str,
    finished: bool,
}

impl<'a> TrainingDisplay<'a> {
    /// `records` holds this run's episodes; `episodes_target` is how many were requested.
    pub fn new(records: &'a [EpisodeRecord], episodes_target: u64, window: usize) -> Self {
        Self {
            records,
            episodes_target,
            window,
            checkpoint: "-",
            finished: false,
        }
    }

    pub fn checkpoint(self, checkpoint: &'a str) -> Self {
        Self { checkpoint, ..self }
    }

    pub fn finished(self, finished: bool) -> Self {
        Self { finished, ..self }
    }

    fn recent(&self) -> &[EpisodeRecord] {
        let start = self.records.len().saturating_sub(self.window);
        &self.records[start..]
    }

    #[expect(clippy::cast_precision_loss)]
    fn ratio(&self) -> f64 {
        if self.episodes_target == 0 {
            return 1.0;
        }
        (self.records.len() as f64 / self.episodes_target as f64).clamp(0.0, 1.0)
    }

    /// Rewards shifted to start at zero, in tenths.
    #[expect(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn sparkline_data(&self, width: usize) -> Vec<u64> {
        let start = self.records.len().saturating_sub(width);
        let rewards = self.records[start..].iter().map(|r| r.total_reward);
        let min = rewards.clone().fold(f64::INFINITY, f64::min);
        rewards.map(|r| ((r - min) * 10.0).round() as u64).collect()
    }
}

impl Widget for TrainingDisplay<'_> {
    fn render(self, area: Rect, buf: &mut Buffer)
    where
        Self: Sized,
    {
        let border = if self.finished {
            color::GREEN
        } else {
            color::WHITE
        };

        let recent = self.recent();
        let rewards = RewardStats::new(recent.iter().map(|r| r.total_reward));
        let scores = RewardStats::new(recent.iter().map(|r| f64::from(r.score)));
        let last = self.records.last();

        let mut panel = StatsPanel::new("STATS")
            .border(border)
            .row(
                "EPISODE:",
                last.map_or("-".to_owned(), |r| r.episode.to_string()),
            )
            .row(
                "EPSILON:",
                last.map_or("-".to_owned(), |r| format!("{:.4}", r.exploration_rate)),
            )
            .row(
                "STEPS:",
                last.map_or("-".to_owned(), |r| r.steps.to_string()),
            )
            .blank()
            .row("WINDOW:", recent.len().to_string());
        if let (Some(rewards), Some(scores)) = (rewards, scores) {
            panel = panel
                .row("R MEAN:", format!("{:.2}", rewards.mean))
                .row("R MED:", format!("{:.2}", rewards.median))
                .row("R MIN:", format!("{:.2}", rewards.min))
                .row("R MAX:", format!("{:.2}", rewards.max))
                .row("R SD:", format!("{:.2}", rewards.std_dev))
                .row("KILLS:", format!("{:.2}", scores.mean));
        }

        let [gauge_area, body_area, help_area] = Layout::vertical([
            Constraint::Length(3),
            Constraint::Fill(1),
            Constraint::Length(1),
        ])
        .areas(area);
        let [chart_area, panel_area] =
            Layout::horizontal([Constraint::Fill(1), Constraint::Length(22)]).areas(body_area);

        let title = if self.finished {
            "TRAINING DONE"
        } else {
            "TRAINING"
        };
        Gauge::default()
            .block(
                Block::bordered()
                    .title(Line::from(title).centered())
                    .border_style(border)
                    .style(style::DEFAULT),
            )
            .gauge_style(Style::new().fg(color::CYAN).bg(color::BLACK))
            .ratio(self.ratio())
            .label(format!("{} / {}", self.records.len(), self.episodes_target))
            .render(gauge_area, buf);

        let chart_block = Block::bordered()
            .title(Line::from("EPISODE REWARD").centered())
            .border_style(border)
            .style(style::DEFAULT);
        let width = usize::from(chart_block.inner(chart_area).width);
        Sparkline::default()
            .block(chart_block)
            .style(Style::new().fg(color::GREEN))
            .data(self.sparkline_data(width))
            .render(chart_area, buf);

        panel.render(panel_area, buf);

        let help = if self.finished {
            format!("q (Quit) | Checkpoint: {}", self.checkpoint)
        } else {
            format!(
                "q / Esc / Ctrl-C (Save & Stop) | Checkpoint: {}",
                self.checkpoint
            )
        };
        Line::from(help)
            .style(style::HELP)
            .centered()
            .render(help_area, buf);
    }
}
