use crossterm::event::Event;
use horde_engine::WorldConfig;
use horde_training::QAgent;
use ratatui::Frame;

use crate::command::play::screens::{auto::AutoPlayScreen, manual::ManualPlayScreen};

mod auto;
mod manual;

#[derive(Debug)]
pub enum Screen {
    Manual(ManualPlayScreen),
    Auto(AutoPlayScreen),
}

impl Screen {
    pub fn manual(world: WorldConfig, seed: u64) -> anyhow::Result<Self> {
        Ok(Screen::Manual(ManualPlayScreen::new(world, seed)?))
    }

    pub fn auto(
        world: WorldConfig,
        seed: u64,
        agent: QAgent,
        max_steps: Option<u64>,
        turbo: bool,
    ) -> anyhow::Result<Self> {
        let screen = AutoPlayScreen::new(world, seed, agent, max_steps, turbo)?;
        Ok(Screen::Auto(screen))
    }

    pub fn is_playing(&self) -> bool {
        match self {
            Screen::Manual(screen) => screen.is_playing(),
            Screen::Auto(screen) => screen.is_playing(),
        }
    }

    pub fn is_exiting(&self) -> bool {
        match self {
            Screen::Manual(screen) => screen.is_exiting(),
            Screen::Auto(screen) => screen.is_exiting(),
        }
    }

    pub fn draw(&self, frame: &mut Frame<'_>) {
        match self {
            Screen::Manual(screen) => screen.draw(frame),
            Screen::Auto(screen) => screen.draw(frame),
        }
    }

    pub(crate) fn handle_event(&mut self, event: &Event) {
        match self {
            Screen::Manual(screen) => screen.handle_event(event),
            Screen::Auto(screen) => screen.handle_event(event),
        }
    }

    pub fn update(&mut self) {
        match self {
            Screen::Manual(screen) => screen.update_game(),
            Screen::Auto(screen) => screen.update_game(),
        }
    }
}
