use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, PartialEq)]
pub struct TestbedConfig {
    #[serde(default = "default_arms")]
    pub arms: usize,
    #[serde(default)]
    pub mean: f64,
    #[serde(default = "default_std_dev")]
    pub std_dev: f64,
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for TestbedConfig {
    fn default() -> Self {
        Self {
            arms: default_arms(),
            mean: 0.0,
            std_dev: default_std_dev(),
            seed: None,
        }
    }
}

#[derive(Debug, Deserialize, PartialEq)]
pub struct AgentConfig {
    pub epsilon: f64,
    #[serde(default)]
    pub seed: Option<u64>,
}

#[derive(Debug, Deserialize, PartialEq)]
pub struct ExperimentConfig {
    #[serde(default = "default_steps")]
    pub steps: usize,
    #[serde(default = "default_trials")]
    pub trials: usize,
    #[serde(default = "default_report_every")]
    pub report_every: usize,
    #[serde(default)]
    pub parallel: bool,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            steps: default_steps(),
            trials: default_trials(),
            report_every: default_report_every(),
            parallel: false,
        }
    }
}

#[derive(Debug, Deserialize, PartialEq)]
pub struct AppConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub testbed: TestbedConfig,
    #[serde(default = "default_agents")]
    pub agents: Vec<AgentConfig>,
    #[serde(default)]
    pub experiment: ExperimentConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let builder = Config::builder()
            .add_source(File::with_name("config").required(false))
            .add_source(
                Environment::with_prefix("APP")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        builder.try_deserialize()
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_arms() -> usize {
    10
}

fn default_std_dev() -> f64 {
    1.0
}

fn default_agents() -> Vec<AgentConfig> {
    [0.0, 0.1, 0.01]
        .into_iter()
        .map(|epsilon| AgentConfig {
            epsilon,
            seed: None,
        })
        .collect()
}

fn default_steps() -> usize {
    1000
}

fn default_trials() -> usize {
    2000
}

fn default_report_every() -> usize {
    100
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::FileFormat;

    fn parse(toml: &str) -> AppConfig {
        Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()
            .and_then(|config| config.try_deserialize())
            .unwrap()
    }

    #[test]
    fn defaults() {
        let config = parse("");
        assert_eq!(config.log_level, "info");
        assert_eq!(config.testbed, TestbedConfig::default());
        assert_eq!(config.experiment, ExperimentConfig::default());
        assert_eq!(config.agents.len(), 3);
        assert_eq!(config.agents[1].epsilon, 0.1);
    }

    #[test]
    fn overrides() {
        let config = parse(
            r#"
            log_level = "debug"

            [testbed]
            arms = 4
            seed = 7

            [[agents]]
            epsilon = 0.2
            seed = 11

            [experiment]
            steps = 50
            parallel = true
            "#,
        );
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.testbed.arms, 4);
        assert_eq!(config.testbed.std_dev, 1.0);
        assert_eq!(config.testbed.seed, Some(7));
        assert_eq!(
            config.agents,
            vec![AgentConfig {
                epsilon: 0.2,
                seed: Some(11)
            }]
        );
        assert_eq!(config.experiment.steps, 50);
        assert_eq!(config.experiment.trials, 2000);
        assert!(config.experiment.parallel);
    }
}
