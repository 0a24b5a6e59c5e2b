use crate::errors::{ConfigurationError, PreconditionError};
use crate::policies::MaybeSeededRng;

use rand::Rng;
use rand_distr::{Distribution, Normal, StandardNormal};
use tracing::debug;

#[derive(Clone, Debug)]
enum TrueMeans {
    Gaussian(Normal<f64>),
    Fixed(Vec<f64>),
}

/// One k-armed bandit problem instance. True means are redrawn on every reset.
#[derive(Clone, Debug)]
pub struct Testbed {
    source: TrueMeans,
    true_means: Vec<f64>,
    optimal_arm: usize,
    reward_std_dev: f64,
    rng: MaybeSeededRng,
}

impl Testbed {
    pub fn new(
        arm_count: usize,
        mean: f64,
        std_dev: f64,
        seed: Option<u64>,
    ) -> Result<Self, ConfigurationError> {
        if arm_count == 0 {
            return Err(ConfigurationError::NoArms);
        }
        if !mean.is_finite() {
            return Err(ConfigurationError::NonFiniteMean(mean));
        }
        let normal = Normal::new(mean, std_dev)
            .ok()
            .filter(|_| std_dev.is_finite() && std_dev >= 0.0)
            .ok_or(ConfigurationError::InvalidStdDev(std_dev))?;

        let mut testbed = Self {
            source: TrueMeans::Gaussian(normal),
            true_means: vec![0.0; arm_count],
            optimal_arm: 0,
            reward_std_dev: 1.0,
            rng: MaybeSeededRng::new(seed),
        };
        testbed.reset();

        Ok(testbed)
    }

    /// Testbed whose true means stay fixed across resets.
    pub fn fixed(true_means: Vec<f64>, seed: Option<u64>) -> Result<Self, ConfigurationError> {
        if true_means.is_empty() {
            return Err(ConfigurationError::NoArms);
        }
        if let Some(&mean) = true_means.iter().find(|mean| !mean.is_finite()) {
            return Err(ConfigurationError::NonFiniteMean(mean));
        }

        let mut testbed = Self {
            source: TrueMeans::Fixed(true_means.clone()),
            true_means,
            optimal_arm: 0,
            reward_std_dev: 1.0,
            rng: MaybeSeededRng::new(seed),
        };
        testbed.reset();

        Ok(testbed)
    }

    /// Standard deviation of sampled rewards around the arm's true mean (1.0 by default).
    pub fn with_reward_noise(mut self, std_dev: f64) -> Result<Self, ConfigurationError> {
        if !std_dev.is_finite() || std_dev < 0.0 {
            return Err(ConfigurationError::InvalidStdDev(std_dev));
        }
        self.reward_std_dev = std_dev;
        Ok(self)
    }

    pub(crate) fn fork(&self, stream: u64) -> Self {
        Self {
            rng: self.rng.fork(stream),
            ..self.clone()
        }
    }

    pub fn arm_count(&self) -> usize {
        self.true_means.len()
    }

    pub fn true_means(&self) -> &[f64] {
        &self.true_means
    }

    pub fn optimal_arm(&self) -> usize {
        self.optimal_arm
    }

    pub fn reset(&mut self) {
        match &self.source {
            TrueMeans::Gaussian(normal) => {
                let rng = self.rng.get_rng();
                self.true_means
                    .iter_mut()
                    .for_each(|mean| *mean = normal.sample(rng));
            }
            TrueMeans::Fixed(means) => self.true_means.copy_from_slice(means),
        }
        self.optimal_arm = first_arg_max(&self.true_means);
        debug!(optimal_arm = self.optimal_arm, "Reset testbed");
    }

    /// Overrides the true means of the current trial.
    pub fn set_true_means(&mut self, true_means: &[f64]) -> Result<(), ConfigurationError> {
        if true_means.len() != self.arm_count() {
            return Err(ConfigurationError::MeanCountMismatch {
                expected: self.arm_count(),
                actual: true_means.len(),
            });
        }
        if let Some(&mean) = true_means.iter().find(|mean| !mean.is_finite()) {
            return Err(ConfigurationError::NonFiniteMean(mean));
        }

        self.true_means.copy_from_slice(true_means);
        self.optimal_arm = first_arg_max(&self.true_means);
        Ok(())
    }

    pub fn sample(&mut self, action: usize) -> Result<f64, PreconditionError> {
        let mean = self
            .true_means
            .get(action)
            .copied()
            .ok_or(PreconditionError::ArmOutOfRange {
                arm: action,
                arm_count: self.true_means.len(),
            })?;
        let noise: f64 = self.rng.get_rng().sample(StandardNormal);

        Ok(mean + self.reward_std_dev * noise)
    }
}

// first occurrence wins on ties
fn first_arg_max(values: &[f64]) -> usize {
    values
        .iter()
        .enumerate()
        .fold((0, f64::NEG_INFINITY), |(best, max), (arm, &value)| {
            if value > max {
                (arm, value)
            } else {
                (best, max)
            }
        })
        .0
}
