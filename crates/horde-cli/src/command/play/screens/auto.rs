use std::{
    sync::mpsc::{self, RecvError, TryRecvError},
    thread,
};

use crossterm::event::{Event, KeyCode};
use horde_engine::{EpisodeState, WorldConfig};
use horde_env::{DiscreteState, Environment as _, ShooterEnv};
use horde_training::QAgent;
use ratatui::{
    Frame,
    layout::{Constraint, Layout},
    text::Text,
};

use crate::ui::widgets::{ArenaDisplay, PlayState, StatsPanel, style};

#[derive(Debug)]
pub struct AutoPlayScreen {
    config: WorldConfig,
    snapshot: Snapshot,
    state: PlayState,
    turbo: bool,
    is_exiting: bool,
    tx: mpsc::Sender<Request>,
    rx: mpsc::Receiver<Snapshot>,
}

impl AutoPlayScreen {
    pub fn new(
        world: WorldConfig,
        seed: u64,
        agent: QAgent,
        max_steps: Option<u64>,
        turbo: bool,
    ) -> anyhow::Result<Self> {
        let env = ShooterEnv::with_seed(world.clone(), seed)?;
        let auto_play = AutoPlay::new(env, agent, max_steps);
        let snapshot = auto_play.snapshot();
        let (tx_request, mut rx_request) = mpsc::channel();
        let (mut tx_snapshot, rx_snapshot) = mpsc::channel();
        thread::spawn(move || agent_thread(auto_play, &mut tx_snapshot, &mut rx_request));
        Ok(Self {
            config: world,
            snapshot,
            state: PlayState::Playing,
            turbo,
            is_exiting: false,
            tx: tx_request,
            rx: rx_snapshot,
        })
    }

    pub fn is_playing(&self) -> bool {
        !self.is_exiting && self.state == PlayState::Playing
    }

    pub fn is_exiting(&self) -> bool {
        self.is_exiting
    }

    pub fn draw(&self, frame: &mut Frame<'_>) {
        let Snapshot { episode, stats } = &self.snapshot;
        let arena = ArenaDisplay::new(episode, &self.config)
            .state(self.state)
            .turbo(self.turbo);
        let stats = StatsPanel::episode("AGENT", episode, &self.config)
            .border(self.state.border_color(self.turbo))
            .blank()
            .row("EPISODE:", (stats.episodes + 1).to_string())
            .row("BEST:", stats.best_score.to_string())
            .row(
                "LAST R:",
                stats
                    .last_reward
                    .map_or("-".to_owned(), |reward| format!("{reward:.1}")),
            );
        let turbo_text = if self.turbo {
            "t (Turbo: ON)"
        } else {
            "t (Turbo: OFF)"
        };
        let help_text = match self.state {
            PlayState::Playing => format!("Controls: {turbo_text} | p (Pause) | q (Quit)"),
            PlayState::Paused | PlayState::GameOver => {
                "Controls: p (Resume) | q (Quit)".to_owned()
            }
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

        if let Some(event) = event.as_key_press_event() {
            match event.code {
                KeyCode::Char('t') if is_playing => self.turbo = !self.turbo,
                KeyCode::Char('p') => {
                    self.state = if is_playing {
                        PlayState::Paused
                    } else {
                        PlayState::Playing
                    };
                }
                KeyCode::Char('q') | KeyCode::Esc => self.is_exiting = true,
                _ => {}
            }
        }
    }

    pub fn update_game(&mut self) {
        let req = if self.turbo {
            Request::TurboRun
        } else {
            Request::Run
        };
        let next = self.tx.send(req).ok().and_then(|()| self.rx.recv().ok());
        match next {
            Some(snapshot) => self.snapshot = snapshot,
            // agent thread is gone
            None => self.is_exiting = true,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Request {
    Run,
    TurboRun,
}

fn agent_thread(
    auto_play: AutoPlay,
    tx: &mut mpsc::Sender<Snapshot>,
    rx: &mut mpsc::Receiver<Request>,
) {
    let mut auto_play = auto_play;
    let Ok(mut req) = rx.recv() else {
        return;
    };

    loop {
        auto_play.step();
        if tx.send(auto_play.snapshot()).is_err() {
            return;
        }

        req = match req {
            Request::Run => match rx.recv() {
                Ok(r) => r,
                Err(RecvError) => return,
            },
            Request::TurboRun => loop {
                match rx.try_recv() {
                    Ok(r) => break r,
                    Err(TryRecvError::Disconnected) => return,
                    Err(TryRecvError::Empty) => auto_play.step(),
                }
            },
        };
    }
}

#[derive(Debug, Clone)]
struct Snapshot {
    episode: EpisodeState,
    stats: PlaybackStats,
}

#[derive(Debug, Default, Clone, Copy, PartialEq)]
struct PlaybackStats {
    /// Finished episodes.
    episodes: u64,
    best_score: u32,
    last_reward: Option<f64>,
}

/// Greedy playback that rolls over into a new episode when one ends.
#[derive(Debug)]
struct AutoPlay {
    env: ShooterEnv,
    agent: QAgent,
    max_steps: Option<u64>,
    state: DiscreteState,
    reward: f64,
    steps: u64,
    score: u32,
    stats: PlaybackStats,
}

impl AutoPlay {
    fn new(mut env: ShooterEnv, agent: QAgent, max_steps: Option<u64>) -> Self {
        let state = env.reset();
        Self {
            env,
            agent,
            max_steps,
            state,
            reward: 0.0,
            steps: 0,
            score: 0,
            stats: PlaybackStats::default(),
        }
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot {
            episode: self.env.episode().clone(),
            stats: self.stats,
        }
    }

    fn step(&mut self) {
        let action = self.agent.greedy_action(&self.state);
        let step = self.env.step(action);
        self.reward += step.reward;
        self.steps += 1;
        self.score += step.kills;

        let truncated = self.max_steps.is_some_and(|max| self.steps >= max);
        if !step.done && !truncated {
            self.state = step.state;
            return;
        }

        self.stats.episodes += 1;
        self.stats.best_score = self.stats.best_score.max(self.score);
        self.stats.last_reward = Some(self.reward);
        self.reward = 0.0;
        self.steps = 0;
        self.score = 0;
        // a finished episode has already been reset by the simulation
        self.state = if step.done { step.state } else { self.env.reset() };
    }
}

#[cfg(test)]
mod tests {
    use horde_env::StateShape;
    use horde_training::AgentParams;

    use super::*;

    fn untrained_agent() -> QAgent {
        QAgent::new(
            StateShape::for_world(&WorldConfig::default()),
            AgentParams::default(),
        )
    }

    fn auto_play(max_steps: Option<u64>) -> AutoPlay {
        let env = ShooterEnv::with_seed(WorldConfig::default(), 7).unwrap();
        AutoPlay::new(env, untrained_agent(), max_steps)
    }

    #[test]
    fn test_step_cap_rolls_over_episode() {
        let mut auto_play = auto_play(Some(3));
        for _ in 0..3 {
            auto_play.step();
        }
        assert_eq!(auto_play.stats.episodes, 1);
        assert!(auto_play.stats.last_reward.is_some());
        assert_eq!(auto_play.steps, 0);
        assert_eq!(auto_play.env.episode().ticks(), 0);
    }

    #[test]
    fn test_agent_thread_answers_requests() {
        let mut screen =
            AutoPlayScreen::new(WorldConfig::default(), 7, untrained_agent(), None, false)
                .unwrap();
        screen.update_game();
        screen.update_game();
        assert!(!screen.is_exiting());
        assert_eq!(screen.snapshot.episode.ticks(), 2);
    }
}
