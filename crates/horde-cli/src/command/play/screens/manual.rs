use crossterm::event::{Event, KeyCode};
use horde_engine::{Action, EpisodeState, Simulation, WorldConfig};
use ratatui::{
    Frame,
    layout::{Constraint, Layout},
    text::Text,
};

use crate::ui::widgets::{ArenaDisplay, PlayState, StatsPanel, style};

#[derive(Debug)]
pub struct ManualPlayScreen {
    sim: Simulation,
    state: PlayState,
    /// Action applied on the next tick; each key press moves or shoots once.
    pending: Action,
    /// Last frame of a finished episode. The simulation itself has already reset.
    final_frame: Option<EpisodeState>,
    /// Reward collected so far in the shown episode.
    reward: f64,
    is_exiting: bool,
}

impl ManualPlayScreen {
    pub fn new(world: WorldConfig, seed: u64) -> anyhow::Result<Self> {
        Ok(Self {
            sim: Simulation::with_seed(world, seed)?,
            state: PlayState::Playing,
            pending: Action::Stay,
            final_frame: None,
            reward: 0.0,
            is_exiting: false,
        })
    }

    pub fn is_playing(&self) -> bool {
        !self.is_exiting && self.state == PlayState::Playing
    }

    pub fn is_exiting(&self) -> bool {
        self.is_exiting
    }

    fn shown_episode(&self) -> &EpisodeState {
        self.final_frame.as_ref().unwrap_or(self.sim.state())
    }

    pub fn draw(&self, frame: &mut Frame<'_>) {
        let config = self.sim.config();
        let episode = self.shown_episode();
        let arena = ArenaDisplay::new(episode, config).state(self.state);
        let stats = StatsPanel::episode("STATS", episode, config)
            .border(self.state.border_color(false))
            .row("REWARD:", format!("{:.1}", self.reward));
        let help_text = match self.state {
            PlayState::Playing => {
                "Controls: W A S D (Move) | ← ↑ → ↓ (Shoot) | p (Pause) | q (Quit)"
            }
            PlayState::Paused => "Controls: p (Resume) | q (Quit)",
            PlayState::GameOver => "Controls: r (Restart) | q (Quit)",
        };
        let help_text = Text::from(help_text).style(style::HELP).centered();

        let [main_area, help_area] =
            Layout::vertical([Constraint::Fill(1), Constraint::Length(1)]).areas(frame.area());
        let [arena_area, stats_area] =
            Layout::horizontal([Constraint::Fill(1), Constraint::Length(22)]).areas(main_area);
        let [stats_area, _] =
            Layout::vertical([Constraint::Length(stats.height()), Constraint::Fill(1)])
                .areas(stats_area);
        frame.render_widget(arena, arena_area);
        frame.render_widget(stats, stats_area);
        frame.render_widget(help_text, help_area);
    }

    pub fn handle_event(&mut self, event: &Event) {
        let is_playing = self.is_playing();
        let can_toggle_pause = matches!(self.state, PlayState::Playing | PlayState::Paused);
        let is_game_over = self.state == PlayState::GameOver;

        if let Some(event) = event.as_key_press_event() {
            match event.code {
                KeyCode::Char('w') if is_playing => self.pending = Action::MoveUp,
                KeyCode::Char('s') if is_playing => self.pending = Action::MoveDown,
                KeyCode::Char('a') if is_playing => self.pending = Action::MoveLeft,
                KeyCode::Char('d') if is_playing => self.pending = Action::MoveRight,
                KeyCode::Up if is_playing => self.pending = Action::ShootUp,
                KeyCode::Down if is_playing => self.pending = Action::ShootDown,
                KeyCode::Left if is_playing => self.pending = Action::ShootLeft,
                KeyCode::Right if is_playing => self.pending = Action::ShootRight,
                KeyCode::Char('p') if can_toggle_pause => self.toggle_pause(),
                KeyCode::Char('r') if is_game_over => self.restart(),
                KeyCode::Char('q') | KeyCode::Esc => self.is_exiting = true,
                _ => {}
            }
        }
    }

    fn toggle_pause(&mut self) {
        self.state = match self.state {
            PlayState::Playing => PlayState::Paused,
            PlayState::Paused => PlayState::Playing,
            PlayState::GameOver => PlayState::GameOver,
        };
    }

    fn restart(&mut self) {
        self.sim.reset();
        self.final_frame = None;
        self.reward = 0.0;
        self.pending = Action::Stay;
        self.state = PlayState::Playing;
    }

    pub fn update_game(&mut self) {
        let action = std::mem::take(&mut self.pending);
        let before = self.sim.state().clone();
        let outcome = self.sim.advance(action);
        self.reward += outcome.reward;
        if outcome.terminal {
            self.final_frame = Some(before);
            self.state = PlayState::GameOver;
        }
    }
}

#[cfg(test)]
mod tests {
    use crossterm::event::{KeyEvent, KeyModifiers};

    use super::*;

    fn press(screen: &mut ManualPlayScreen, code: KeyCode) {
        screen.handle_event(&Event::Key(KeyEvent::new(code, KeyModifiers::NONE)));
    }

    #[test]
    fn test_key_press_moves_once() {
        let mut screen = ManualPlayScreen::new(WorldConfig::default(), 1).unwrap();
        let start = screen.sim.state().player().position();

        press(&mut screen, KeyCode::Char('d'));
        screen.update_game();
        let moved = screen.sim.state().player().position();
        assert!(moved.x > start.x);

        screen.update_game();
        assert_eq!(screen.sim.state().player().position(), moved);
        assert!(screen.reward > 0.0);
    }

    #[test]
    fn test_pause_blocks_input() {
        let mut screen = ManualPlayScreen::new(WorldConfig::default(), 1).unwrap();
        press(&mut screen, KeyCode::Char('p'));
        assert!(!screen.is_playing());
        press(&mut screen, KeyCode::Up);
        assert_eq!(screen.pending, Action::Stay);
        press(&mut screen, KeyCode::Char('p'));
        assert!(screen.is_playing());
        press(&mut screen, KeyCode::Char('q'));
        assert!(screen.is_exiting());
    }
}
