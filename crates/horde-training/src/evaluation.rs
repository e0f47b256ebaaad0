use horde_env::Environment;
use tracing::debug;

use crate::{
    agent::QAgent,
    run_log::{EpisodeRecord, RunLog},
};

/// Plays `episodes` episodes with the greedy policy, learning nothing.
///
/// Records carry an exploration rate of zero whatever the agent stores.
pub fn evaluate<E>(env: &mut E, agent: &QAgent, episodes: u64, max_steps: Option<u64>) -> RunLog
where
    E: Environment,
{
    let mut log = RunLog::new();
    for episode in 1..=episodes {
        let mut state = env.reset();
        let mut total_reward = 0.0;
        let mut steps = 0;
        let mut score = 0;
        let mut truncated = false;

        loop {
            let step = env.step(agent.greedy_action(&state));
            total_reward += step.reward;
            steps += 1;
            score += step.kills;
            if step.done {
                break;
            }
            if max_steps.is_some_and(|max| steps >= max) {
                truncated = true;
                break;
            }
            state = step.state;
        }

        let record = EpisodeRecord {
            episode,
            total_reward,
            steps,
            score,
            exploration_rate: 0.0,
            truncated,
        };
        debug!(
            episode,
            reward = total_reward,
            steps,
            score,
            truncated,
            "evaluation episode finished"
        );
        log.push(record);
    }
    log
}
