use bandit_testbed::config::AppConfig;
use bandit_testbed::errors::AppError;
use bandit_testbed::{EpsilonGreedy, Experiment, Testbed};

use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), AppError> {
    let config = AppConfig::from_env()?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let testbed = Testbed::new(
        config.testbed.arms,
        config.testbed.mean,
        config.testbed.std_dev,
        config.testbed.seed,
    )?;
    let agents = config
        .agents
        .iter()
        .map(|agent| EpsilonGreedy::new(config.testbed.arms, agent.epsilon, agent.seed))
        .collect::<Result<Vec<_>, _>>()?;
    let mut experiment = Experiment::new(
        testbed,
        agents,
        config.experiment.steps,
        config.experiment.trials,
    )?
    .with_report_every(config.experiment.report_every)?;

    info!(agents = ?experiment.labels(), "Running");
    let results = if config.experiment.parallel {
        experiment.run_parallel()?
    } else {
        experiment.run()?
    };

    println!("{}", serde_json::to_string(&results)?);
    Ok(())
}
