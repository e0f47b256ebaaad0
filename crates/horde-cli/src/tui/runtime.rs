use std::{io, time::Duration};

use crate::tui::{
    App,
    event_loop::{EventLoop, RenderMode, TuiEvent},
};

#[derive(Debug, Default)]
pub struct Runtime {
    events: EventLoop,
}

impl Runtime {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Ticks per second. `None` stops tick events.
    pub fn set_tick_rate(&mut self, rate: Option<f64>) {
        self.events
            .set_tick_interval(rate.map(|rate| Duration::from_secs_f64(1.0 / rate)));
    }

    pub fn set_render_mode(&mut self, mode: RenderMode) {
        self.events.set_render_mode(mode);
    }

    /// Runs `app` on the alternate screen until [`App::should_exit`] is true.
    pub fn run<A>(mut self, app: &mut A) -> io::Result<()>
    where
        A: App,
    {
        app.init(&mut self);

        ratatui::run(|terminal| {
            while !app.should_exit() {
                match self.events.next()? {
                    TuiEvent::Tick => app.update(&mut self),
                    TuiEvent::Render => {
                        terminal.draw(|frame| app.draw(frame))?;
                    }
                    TuiEvent::Input(event) => app.handle_event(&mut self, event),
                }
            }
            Ok(())
        })
    }
}
