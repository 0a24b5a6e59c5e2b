use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigurationError {
    #[error("Arm count must be at least 1")]
    NoArms,
    #[error("Mean must be finite, got {0}")]
    NonFiniteMean(f64),
    #[error("Standard deviation must be finite and non-negative, got {0}")]
    InvalidStdDev(f64),
    #[error("Epsilon must be in [0, 1], got {0}")]
    EpsilonOutOfRange(f64),
    #[error("Steps per trial must be at least 1")]
    NoSteps,
    #[error("Trial count must be at least 1")]
    NoTrials,
    #[error("At least one agent is required")]
    NoAgents,
    #[error("Agent has {agent} arms but testbed has {testbed}")]
    ArmCountMismatch { agent: usize, testbed: usize },
    #[error("Expected {expected} true means, got {actual}")]
    MeanCountMismatch { expected: usize, actual: usize },
    #[error("Progress report interval must be at least 1")]
    NoReportInterval,
}

#[derive(Debug, Error, PartialEq)]
pub enum PreconditionError {
    #[error("Arm {arm} out of range for {arm_count} arms")]
    ArmOutOfRange { arm: usize, arm_count: usize },
    #[error("Update called before any action was selected")]
    NoActionSelected,
    #[error("Reward must be finite, got {0}")]
    NonFiniteReward(f64),
}

#[derive(Debug, Error, PartialEq)]
pub enum SimulationError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    #[error(transparent)]
    Precondition(#[from] PreconditionError),
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Cannot read config: {0}")]
    Config(#[from] config::ConfigError),
    #[error(transparent)]
    Simulation(#[from] SimulationError),
    #[error("Failed to serialize results to JSON: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<ConfigurationError> for AppError {
    fn from(err: ConfigurationError) -> Self {
        AppError::Simulation(err.into())
    }
}
