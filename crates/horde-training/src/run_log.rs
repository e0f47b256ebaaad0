use serde::{Deserialize, Serialize};

/// Outcome of one training or evaluation episode.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EpisodeRecord {
    /// 1-based episode number, counted across resumed runs.
    pub episode: u64,
    pub total_reward: f64,
    pub steps: u64,
    /// Zombies killed.
    pub score: u32,
    /// Exploration rate after the end-of-episode decay.
    pub exploration_rate: f64,
    /// Whether the episode hit the step cap instead of ending by death.
    pub truncated: bool,
}

/// Every episode of a run, in order.
#[derive(Debug, Default, Clone)]
pub struct RunLog {
    records: Vec<EpisodeRecord>,
}

impl RunLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: EpisodeRecord) {
        self.records.push(record);
    }

    #[must_use]
    pub fn records(&self) -> &[EpisodeRecord] {
        &self.records
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    #[must_use]
    pub fn last(&self) -> Option<&EpisodeRecord> {
        self.records.last()
    }

    /// The last `window` records (fewer if the run is shorter).
    #[must_use]
    pub fn recent(&self, window: usize) -> &[EpisodeRecord] {
        let start = self.records.len().saturating_sub(window);
        &self.records[start..]
    }

    /// Reward statistics over the last `window` episodes.
    #[must_use]
    pub fn reward_stats(&self, window: usize) -> Option<RewardStats> {
        RewardStats::new(self.recent(window).iter().map(|r| r.total_reward))
    }

    /// Score statistics over the last `window` episodes.
    #[must_use]
    pub fn score_stats(&self, window: usize) -> Option<RewardStats> {
        RewardStats::new(self.recent(window).iter().map(|r| f64::from(r.score)))
    }
}

/// Summary statistics of a sample of episode values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RewardStats {
    pub count: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub median: f64,
    pub std_dev: f64,
}

impl RewardStats {
    /// Computes statistics from unsorted values. Returns `None` for an empty sample.
    ///
    /// ```
    /// # use horde_training::run_log::RewardStats;
    /// let stats = RewardStats::new([4.0, -2.0, 1.0]).unwrap();
    /// assert_eq!(stats.min, -2.0);
    /// assert_eq!(stats.median, 1.0);
    /// ```
    #[must_use]
    pub fn new<I>(values: I) -> Option<Self>
    where
        I: IntoIterator<Item = f64>,
    {
        let mut values = values.into_iter().collect::<Vec<_>>();
        values.sort_by(f64::total_cmp);
        Self::from_sorted(&values)
    }

    /// Like [`Self::new`], for values already sorted in ascending order.
    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn from_sorted(sorted_values: &[f64]) -> Option<Self> {
        assert!(
            sorted_values.is_sorted_by(|a, b| a <= b),
            "values must be sorted in ascending order"
        );

        let min = *sorted_values.first()?;
        let max = *sorted_values.last()?;
        let count = sorted_values.len();
        let n = count as f64;
        let mean = sorted_values.iter().sum::<f64>() / n;
        let median = if count % 2 == 0 {
            f64::midpoint(sorted_values[count / 2 - 1], sorted_values[count / 2])
        } else {
            sorted_values[count / 2]
        };
        let variance = sorted_values
            .iter()
            .map(|v| (v - mean).powi(2))
            .sum::<f64>()
            / n;

        Some(Self {
            count,
            min,
            max,
            mean,
            median,
            std_dev: variance.sqrt(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(episode: u64, total_reward: f64) -> EpisodeRecord {
        EpisodeRecord {
            episode,
            total_reward,
            steps: 10,
            score: 1,
            exploration_rate: 0.5,
            truncated: false,
        }
    }

    #[test]
    fn test_stats_of_empty_sample() {
        assert!(RewardStats::new([]).is_none());
        assert!(RunLog::new().reward_stats(10).is_none());
    }

    #[test]
    fn test_stats_values() {
        let stats = RewardStats::new([2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]).unwrap();
        assert_eq!(stats.count, 8);
        assert!((stats.mean - 5.0).abs() < 1e-12);
        assert!((stats.median - 4.5).abs() < 1e-12);
        assert!((stats.std_dev - 2.0).abs() < 1e-12);
        assert!((stats.min - 2.0).abs() < 1e-12);
        assert!((stats.max - 9.0).abs() < 1e-12);
    }

    #[test]
    fn test_recent_window() {
        let mut log = RunLog::new();
        for i in 1..=5 {
            log.push(record(i, f64::from(u32::try_from(i).unwrap())));
        }
        assert_eq!(log.recent(2).len(), 2);
        assert_eq!(log.recent(2)[0].episode, 4);
        assert_eq!(log.recent(100).len(), 5);

        let stats = log.reward_stats(3).unwrap();
        assert!((stats.mean - 4.0).abs() < 1e-12);
        assert_eq!(log.last().map(|r| r.episode), Some(5));
    }
}
