use crossterm::event::Event;
use horde_engine::WorldConfig;
use horde_training::QAgent;
use ratatui::Frame;

use crate::{
    command::play::screens::Screen,
    tui::{App, RenderMode, Runtime},
};

const MAX_FPS: f64 = 60.0;

#[derive(Debug)]
pub struct PlayApp {
    screen: Screen,
    tick_rate: f64,
}

impl PlayApp {
    pub fn manual(world: WorldConfig, seed: u64) -> anyhow::Result<Self> {
        let tick_rate = f64::from(world.tick_rate);
        Ok(Self {
            screen: Screen::manual(world, seed)?,
            tick_rate,
        })
    }

    pub fn auto(
        world: WorldConfig,
        seed: u64,
        agent: QAgent,
        max_steps: Option<u64>,
        turbo: bool,
    ) -> anyhow::Result<Self> {
        let tick_rate = f64::from(world.tick_rate);
        Ok(Self {
            screen: Screen::auto(world, seed, agent, max_steps, turbo)?,
            tick_rate,
        })
    }
}

impl App for PlayApp {
    fn init(&mut self, runtime: &mut Runtime) {
        // one simulation tick per timer tick
        runtime.set_tick_rate(Some(self.tick_rate));
        runtime.set_render_mode(RenderMode::throttled_from_rate(self.tick_rate.min(MAX_FPS)));
    }

    fn should_exit(&self) -> bool {
        self.screen.is_exiting()
    }

    fn handle_event(&mut self, _runtime: &mut Runtime, event: Event) {
        self.screen.handle_event(&event);
    }

    fn draw(&self, frame: &mut Frame) {
        self.screen.draw(frame);
    }

    fn update(&mut self, _runtime: &mut Runtime) {
        if self.screen.is_playing() {
            self.screen.update();
        }
    }
}
