pub mod config;
pub mod errors;
pub mod experiment;
pub mod policies;
pub mod testbed;

pub use errors::{ConfigurationError, PreconditionError, SimulationError};
pub use experiment::{Experiment, ExperimentResults, StepTable};
pub use policies::EpsilonGreedy;
pub use testbed::Testbed;
