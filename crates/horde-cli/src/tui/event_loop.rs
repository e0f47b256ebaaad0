use std::{
    io,
    time::{Duration, Instant},
};

use crossterm::event::{self, Event};

#[derive(Debug, Clone, derive_more::From)]
pub(super) enum TuiEvent {
    Tick,
    Render,
    Input(Event),
}

/// When frames are drawn.
#[derive(Debug, Clone, Copy, Default)]
pub enum RenderMode {
    /// After every tick or input event.
    #[default]
    OnDirty,
    /// After a tick or input event, at most once per interval.
    Throttled(Duration),
}

impl RenderMode {
    #[must_use]
    pub fn throttled_from_rate(rate: f64) -> Self {
        Self::Throttled(Duration::from_secs_f64(1.0 / rate))
    }

    fn min_interval(self) -> Duration {
        match self {
            Self::OnDirty => Duration::ZERO,
            Self::Throttled(interval) => interval,
        }
    }
}

/// Produces tick, render and input events in time order.
#[derive(Debug)]
pub(super) struct EventLoop {
    tick_interval: Option<Duration>,
    render_mode: RenderMode,
    last_tick: Instant,
    last_render: Instant,
    dirty: bool,
}

impl Default for EventLoop {
    fn default() -> Self {
        let now = Instant::now();
        Self {
            tick_interval: None,
            render_mode: RenderMode::default(),
            last_tick: now,
            last_render: now.checked_sub(Duration::from_secs(1)).unwrap_or(now),
            // first frame
            dirty: true,
        }
    }
}

impl EventLoop {
    pub(super) fn set_tick_interval(&mut self, interval: Option<Duration>) {
        self.tick_interval = interval;
    }

    pub(super) fn set_render_mode(&mut self, render_mode: RenderMode) {
        self.render_mode = render_mode;
    }

    /// Blocks until the next tick or render is due, or terminal input arrives.
    pub(super) fn next(&mut self) -> io::Result<TuiEvent> {
        loop {
            let now = Instant::now();
            if let Some(interval) = self.tick_interval
                && now.duration_since(self.last_tick) >= interval
            {
                // keep the cadence without bursting after a stall
                let floor = now.checked_sub(interval).unwrap_or(now);
                self.last_tick = (self.last_tick + interval).max(floor);
                self.dirty = true;
                return Ok(TuiEvent::Tick);
            }

            let render_due = self.render_due_at();
            if render_due.is_some_and(|at| at <= now) {
                self.last_render = now;
                self.dirty = false;
                return Ok(TuiEvent::Render);
            }

            let next_tick = self.tick_interval.map(|interval| self.last_tick + interval);
            let wake_at = [next_tick, render_due].into_iter().flatten().min();
            let timeout = wake_at.map_or(Duration::from_secs(1), |at| {
                at.saturating_duration_since(now)
            });
            if event::poll(timeout)? {
                self.dirty = true;
                return Ok(event::read()?.into());
            }
        }
    }

    fn render_due_at(&self) -> Option<Instant> {
        self.dirty
            .then(|| self.last_render + self.render_mode.min_interval())
    }
}
