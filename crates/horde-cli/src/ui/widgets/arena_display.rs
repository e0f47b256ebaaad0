use horde_engine::{EpisodeState, Rect as WorldRect, WorldConfig};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::Color,
    symbols::Marker,
    widgets::{
        Block, Widget,
        canvas::{Canvas, Context, Line, Rectangle},
    },
};

use crate::ui::widgets::{PlayState, color, render_popup, style};

const AIM_LENGTH: f32 = 30.0;

/// The arena drawn on a braille canvas.
///
/// World coordinates have `y` growing downward, the canvas has it growing
/// upward, so every shape is flipped on the way in.
#[derive(Debug)]
pub struct ArenaDisplay<'a> {
    episode: &'a EpisodeState,
    config: &'a WorldConfig,
    state: PlayState,
    turbo: bool,
}

impl<'a> ArenaDisplay<'a> {
    pub fn new(episode: &'a EpisodeState, config: &'a WorldConfig) -> Self {
        Self {
            episode,
            config,
            state: PlayState::Playing,
            turbo: false,
        }
    }

    pub fn state(self, state: PlayState) -> Self {
        Self { state, ..self }
    }

    pub fn turbo(self, turbo: bool) -> Self {
        Self { turbo, ..self }
    }

    fn draw_rect(&self, ctx: &mut Context<'_>, rect: WorldRect, color: Color) {
        ctx.draw(&Rectangle {
            x: f64::from(rect.left()),
            y: f64::from(self.config.height - rect.bottom()),
            width: f64::from(rect.size.width),
            height: f64::from(rect.size.height),
            color,
        });
    }
}

impl Widget for ArenaDisplay<'_> {
    fn render(self, area: Rect, buf: &mut Buffer)
    where
        Self: Sized,
    {
        Widget::render(&self, area, buf);
    }
}

impl Widget for &ArenaDisplay<'_> {
    fn render(self, area: Rect, buf: &mut Buffer)
    where
        Self: Sized,
    {
        let height = self.config.height;
        let block = Block::bordered()
            .border_style(self.state.border_color(self.turbo))
            .style(style::DEFAULT);

        Canvas::default()
            .block(block.clone())
            .marker(Marker::Braille)
            .background_color(color::BLACK)
            .x_bounds([0.0, f64::from(self.config.width)])
            .y_bounds([0.0, f64::from(height)])
            .paint(|ctx| {
                for zombie in self.episode.zombies() {
                    self.draw_rect(ctx, zombie.rect(), color::GREEN);
                }
                ctx.layer();
                for bullet in self.episode.bullets() {
                    self.draw_rect(ctx, bullet.rect(), color::YELLOW);
                }
                ctx.layer();

                let player = self.episode.player();
                self.draw_rect(ctx, player.rect(), color::CYAN);
                let from = player.center();
                let to = from + player.aim().unit() * AIM_LENGTH;
                ctx.draw(&Line::new(
                    f64::from(from.x),
                    f64::from(height - from.y),
                    f64::from(to.x),
                    f64::from(height - to.y),
                    color::WHITE,
                ));
            })
            .render(area, buf);

        if let Some((text, style)) = self.state.popup() {
            render_popup(block.inner(area), buf, text, style);
        }
    }
}
