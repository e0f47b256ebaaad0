use crossterm::event::Event;
use ratatui::Frame;

use crate::tui::Runtime;

/// Application driven by [`Runtime::run`].
pub trait App {
    /// Called once before the first event. Configure tick and render rates here.
    fn init(&mut self, runtime: &mut Runtime);

    fn should_exit(&self) -> bool;

    /// Terminal input (keys, resize, ...).
    fn handle_event(&mut self, runtime: &mut Runtime, event: Event);

    fn draw(&self, frame: &mut Frame);

    /// Advances application state; called once per tick.
    fn update(&mut self, runtime: &mut Runtime);
}
