use super::rng::MaybeSeededRng;

use crate::errors::{ConfigurationError, PreconditionError};

use rand::{seq::IteratorRandom, Rng};
use std::fmt;

/// Sample-average action-value agent with an epsilon-greedy policy.
/// An epsilon of 0 gives the purely greedy agent.
#[derive(Clone, Debug)]
pub struct EpsilonGreedy {
    epsilon: f64,
    action_counts: Vec<u64>,
    reward_sums: Vec<f64>,
    value_estimates: Vec<f64>,
    last_action: Option<usize>,
    time_step: u64,
    rng: MaybeSeededRng,
}

impl EpsilonGreedy {
    pub fn new(
        arm_count: usize,
        epsilon: f64,
        seed: Option<u64>,
    ) -> Result<Self, ConfigurationError> {
        if arm_count == 0 {
            return Err(ConfigurationError::NoArms);
        }
        if !(0.0..=1.0).contains(&epsilon) {
            return Err(ConfigurationError::EpsilonOutOfRange(epsilon));
        }

        Ok(Self {
            epsilon,
            action_counts: vec![0; arm_count],
            reward_sums: vec![0.0; arm_count],
            value_estimates: vec![0.0; arm_count],
            last_action: None,
            time_step: 0,
            rng: MaybeSeededRng::new(seed),
        })
    }

    pub fn greedy(arm_count: usize, seed: Option<u64>) -> Result<Self, ConfigurationError> {
        Self::new(arm_count, 0.0, seed)
    }

    /// Copy of this agent with a generator forked for `stream`.
    pub(crate) fn fork(&self, stream: u64) -> Self {
        Self {
            rng: self.rng.fork(stream),
            ..self.clone()
        }
    }

    pub fn arm_count(&self) -> usize {
        self.value_estimates.len()
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    pub fn action_counts(&self) -> &[u64] {
        &self.action_counts
    }

    pub fn reward_sums(&self) -> &[f64] {
        &self.reward_sums
    }

    pub fn value_estimates(&self) -> &[f64] {
        &self.value_estimates
    }

    pub fn last_action(&self) -> Option<usize> {
        self.last_action
    }

    pub fn time_step(&self) -> u64 {
        self.time_step
    }

    pub fn reset(&mut self) {
        self.action_counts.fill(0);
        self.reward_sums.fill(0.0);
        self.value_estimates.fill(0.0);
        self.last_action = None;
        self.time_step = 0;
    }

    pub fn select_action(&mut self) -> usize {
        let rng = self.rng.get_rng();
        let arm = if rng.random::<f64>() < self.epsilon {
            rng.random_range(0..self.value_estimates.len())
        } else {
            // ties are broken uniformly, never towards the lowest index
            let best = self
                .value_estimates
                .iter()
                .copied()
                .fold(f64::NEG_INFINITY, f64::max);
            self.value_estimates
                .iter()
                .enumerate()
                .filter(|(_, &value)| value == best)
                .map(|(arm, _)| arm)
                .choose(&mut *rng)
                .unwrap_or_else(|| rng.random_range(0..self.value_estimates.len()))
        };

        self.last_action = Some(arm);
        arm
    }

    pub fn update(&mut self, reward: f64) -> Result<(), PreconditionError> {
        let arm = self.last_action.ok_or(PreconditionError::NoActionSelected)?;
        if !reward.is_finite() {
            return Err(PreconditionError::NonFiniteReward(reward));
        }

        self.action_counts[arm] += 1;
        self.reward_sums[arm] += reward;
        self.value_estimates[arm] = self.reward_sums[arm] / self.action_counts[arm] as f64;
        self.time_step += 1;

        Ok(())
    }
}

impl fmt::Display for EpsilonGreedy {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.epsilon == 0.0 {
            write!(f, "Greedy")
        } else {
            write!(f, "Epsilon = {}", self.epsilon)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEED: Option<u64> = Some(1234);

    #[test]
    fn create() {
        let agent = EpsilonGreedy::new(5, 0.1, SEED).unwrap();
        assert_eq!(agent.arm_count(), 5);
        assert_eq!(agent.value_estimates(), &[0.0; 5]);
        assert_eq!(agent.last_action(), None);
    }

    #[test]
    fn invalid_parameters() {
        assert_eq!(
            EpsilonGreedy::new(0, 0.1, SEED).err(),
            Some(ConfigurationError::NoArms)
        );
        assert_eq!(
            EpsilonGreedy::new(3, 1.5, SEED).err(),
            Some(ConfigurationError::EpsilonOutOfRange(1.5))
        );
        assert!(EpsilonGreedy::new(3, -0.1, SEED).is_err());
        assert!(EpsilonGreedy::new(3, f64::NAN, SEED).is_err());
        assert!(EpsilonGreedy::new(3, 1.0, SEED).is_ok());
    }

    #[test]
    fn update_before_select() {
        let mut agent = EpsilonGreedy::greedy(3, SEED).unwrap();
        assert_eq!(agent.update(1.0), Err(PreconditionError::NoActionSelected));
    }

    #[test]
    fn update_after_reset_requires_new_select() {
        let mut agent = EpsilonGreedy::greedy(3, SEED).unwrap();
        agent.select_action();
        assert!(agent.update(1.0).is_ok());
        agent.reset();
        assert_eq!(agent.update(1.0), Err(PreconditionError::NoActionSelected));
    }

    #[test]
    fn non_finite_reward() {
        let mut agent = EpsilonGreedy::greedy(3, SEED).unwrap();
        agent.select_action();
        assert_eq!(
            agent.update(f64::INFINITY),
            Err(PreconditionError::NonFiniteReward(f64::INFINITY))
        );
        assert_eq!(agent.time_step(), 0);
    }

    #[test]
    fn draw_best() {
        let mut agent = EpsilonGreedy::greedy(4, SEED).unwrap();
        agent.value_estimates[2] = 1.0;
        for _ in 0..100 {
            assert_eq!(agent.select_action(), 2);
        }
    }

    #[test]
    fn greedy_tie_break_is_uniform() {
        let arms = 4;
        let draws = 8000;
        let mut agent = EpsilonGreedy::greedy(arms, SEED).unwrap();
        let mut counts = vec![0usize; arms];
        for _ in 0..draws {
            counts[agent.select_action()] += 1;
        }

        let expected = draws / arms;
        for count in counts {
            assert!(count.abs_diff(expected) < expected / 10, "{count}");
        }
    }

    #[test]
    fn tie_break_only_among_best() {
        let mut agent = EpsilonGreedy::greedy(4, SEED).unwrap();
        agent.value_estimates = vec![0.5, -1.0, 0.5, 0.2];
        let mut seen = [false; 4];
        for _ in 0..200 {
            seen[agent.select_action()] = true;
        }
        assert_eq!(seen, [true, false, true, false]);
    }

    #[test]
    fn nan_estimates_fall_back_to_uniform_arm() {
        let mut agent = EpsilonGreedy::greedy(3, SEED).unwrap();
        agent.value_estimates = vec![f64::NAN; 3];
        let mut seen = [false; 3];
        for _ in 0..200 {
            seen[agent.select_action()] = true;
        }
        assert_eq!(seen, [true; 3]);
    }

    #[test]
    fn nearby_seeds_fork_into_different_choices() {
        let mut a = EpsilonGreedy::new(10, 0.1, Some(42)).unwrap().fork(1);
        let mut b = EpsilonGreedy::new(10, 0.1, Some(43)).unwrap().fork(0);
        let xs: Vec<usize> = (0..20).map(|_| a.select_action()).collect();
        let ys: Vec<usize> = (0..20).map(|_| b.select_action()).collect();
        assert_ne!(xs, ys);
    }

    #[test]
    fn full_exploration_covers_all_arms() {
        let mut agent = EpsilonGreedy::new(3, 1.0, SEED).unwrap();
        agent.value_estimates[0] = 10.0;
        let mut seen = [false; 3];
        for _ in 0..200 {
            seen[agent.select_action()] = true;
        }
        assert_eq!(seen, [true; 3]);
    }

    #[test]
    fn incremental_mean() {
        let rewards = [1.5, -0.25, 3.0, 0.75, 2.0, -1.0];
        let mut agent = EpsilonGreedy::new(1, 0.1, SEED).unwrap();
        for &reward in &rewards {
            assert_eq!(agent.select_action(), 0);
            agent.update(reward).unwrap();
        }

        let mean = rewards.iter().sum::<f64>() / rewards.len() as f64;
        assert!((agent.value_estimates()[0] - mean).abs() < 1e-12);
        assert_eq!(agent.action_counts(), &[rewards.len() as u64]);
        assert_eq!(agent.time_step(), rewards.len() as u64);
    }

    #[test]
    fn update() {
        let mut agent = EpsilonGreedy::greedy(2, SEED).unwrap();
        let arm = agent.select_action();
        agent.update(1.0).unwrap();
        assert_eq!(agent.value_estimates()[arm], 1.0);
        assert_eq!(agent.value_estimates()[1 - arm], 0.0);
        assert_eq!(agent.action_counts()[arm], 1);
    }

    #[test]
    fn reset_clears_history() {
        let mut agent = EpsilonGreedy::new(5, 0.3, SEED).unwrap();
        for step in 0..50 {
            agent.select_action();
            agent.update(step as f64 * 0.1).unwrap();
        }

        agent.reset();
        assert_eq!(agent.value_estimates(), &[0.0; 5]);
        assert_eq!(agent.reward_sums(), &[0.0; 5]);
        assert_eq!(agent.action_counts(), &[0; 5]);
        assert_eq!(agent.last_action(), None);
        assert_eq!(agent.time_step(), 0);
    }

    #[test]
    fn labels() {
        assert_eq!(EpsilonGreedy::greedy(2, SEED).unwrap().to_string(), "Greedy");
        assert_eq!(
            EpsilonGreedy::new(2, 0.1, SEED).unwrap().to_string(),
            "Epsilon = 0.1"
        );
        assert_eq!(
            EpsilonGreedy::new(2, 0.01, SEED).unwrap().to_string(),
            "Epsilon = 0.01"
        );
    }
}
