use crate::errors::{ConfigurationError, SimulationError};
use crate::policies::EpsilonGreedy;
use crate::testbed::Testbed;

use rayon::prelude::*;
use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;
use tracing::{debug, info};

/// Per-step, per-agent table of averaged statistics.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(transparent)]
pub struct StepTable {
    rows: Vec<Vec<f64>>,
}

impl StepTable {
    pub fn steps(&self) -> usize {
        self.rows.len()
    }

    pub fn agents(&self) -> usize {
        self.rows.first().map_or(0, Vec::len)
    }

    pub fn get(&self, step: usize, agent: usize) -> Option<f64> {
        self.rows.get(step).and_then(|row| row.get(agent)).copied()
    }

    pub fn row(&self, step: usize) -> Option<&[f64]> {
        self.rows.get(step).map(Vec::as_slice)
    }

    /// Values of one agent over all steps.
    pub fn column(&self, agent: usize) -> Vec<f64> {
        self.rows.iter().filter_map(|row| row.get(agent).copied()).collect()
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct ExperimentResults {
    pub labels: Vec<String>,
    pub average_rewards: StepTable,
    pub optimal_action_fraction: StepTable,
}

// Running sums, flattened as step * agents + agent.
#[derive(Clone, Debug)]
struct Totals {
    agents: usize,
    rewards: Vec<f64>,
    optimal: Vec<f64>,
}

impl Totals {
    fn new(steps: usize, agents: usize) -> Self {
        Self {
            agents,
            rewards: vec![0.0; steps * agents],
            optimal: vec![0.0; steps * agents],
        }
    }

    fn record(&mut self, step: usize, agent: usize, reward: f64, is_optimal: bool) {
        let index = step * self.agents + agent;
        self.rewards[index] += reward;
        if is_optimal {
            self.optimal[index] += 1.0;
        }
    }

    fn merge(mut self, other: Self) -> Self {
        self.rewards
            .iter_mut()
            .zip(other.rewards)
            .for_each(|(total, partial)| *total += partial);
        self.optimal
            .iter_mut()
            .zip(other.optimal)
            .for_each(|(total, partial)| *total += partial);
        self
    }

    fn average(values: Vec<f64>, agents: usize, trials: usize) -> StepTable {
        StepTable {
            rows: values
                .chunks(agents)
                .map(|row| row.iter().map(|total| total / trials as f64).collect())
                .collect(),
        }
    }

    fn into_tables(self, trials: usize) -> (StepTable, StepTable) {
        (
            Self::average(self.rewards, self.agents, trials),
            Self::average(self.optimal, self.agents, trials),
        )
    }
}

/// Drives repeated independent trials of a set of agents against one testbed.
pub struct Experiment {
    testbed: Testbed,
    agents: Vec<EpsilonGreedy>,
    steps: usize,
    trials: usize,
    report_every: usize,
}

impl Experiment {
    pub fn new(
        testbed: Testbed,
        agents: Vec<EpsilonGreedy>,
        steps: usize,
        trials: usize,
    ) -> Result<Self, ConfigurationError> {
        if steps == 0 {
            return Err(ConfigurationError::NoSteps);
        }
        if trials == 0 {
            return Err(ConfigurationError::NoTrials);
        }
        if agents.is_empty() {
            return Err(ConfigurationError::NoAgents);
        }
        if let Some(agent) = agents
            .iter()
            .find(|agent| agent.arm_count() != testbed.arm_count())
        {
            return Err(ConfigurationError::ArmCountMismatch {
                agent: agent.arm_count(),
                testbed: testbed.arm_count(),
            });
        }

        Ok(Self {
            testbed,
            agents,
            steps,
            trials,
            report_every: 100,
        })
    }

    pub fn with_report_every(mut self, report_every: usize) -> Result<Self, ConfigurationError> {
        if report_every == 0 {
            return Err(ConfigurationError::NoReportInterval);
        }
        self.report_every = report_every;
        Ok(self)
    }

    pub fn testbed(&self) -> &Testbed {
        &self.testbed
    }

    pub fn agents(&self) -> &[EpsilonGreedy] {
        &self.agents
    }

    pub fn labels(&self) -> Vec<String> {
        self.agents.iter().map(ToString::to_string).collect()
    }

    pub fn run(&mut self) -> Result<ExperimentResults, SimulationError> {
        self.run_with_progress(|completed| info!(completed, "Completed trials"))
    }

    /// Sequential run; `on_progress` receives the number of completed trials
    /// every `report_every` trials.
    pub fn run_with_progress<F>(
        &mut self,
        mut on_progress: F,
    ) -> Result<ExperimentResults, SimulationError>
    where
        F: FnMut(usize),
    {
        info!(
            trials = self.trials,
            steps = self.steps,
            agents = self.agents.len(),
            "Starting experiment"
        );
        let start = Instant::now();
        let mut totals = Totals::new(self.steps, self.agents.len());

        for trial in 0..self.trials {
            if trial % self.report_every == 0 {
                on_progress(trial);
            }
            play_trial(&mut self.testbed, &mut self.agents, self.steps, &mut totals)?;
        }

        info!(elapsed = ?start.elapsed(), "Finished experiment");
        Ok(self.results(totals))
    }

    /// Runs trials in parallel. Each trial works on its own copy of the testbed
    /// and agents, forked from their seeds by trial index, so seeded runs give
    /// the same output whatever the thread scheduling.
    pub fn run_parallel(&self) -> Result<ExperimentResults, SimulationError> {
        info!(
            trials = self.trials,
            steps = self.steps,
            agents = self.agents.len(),
            threads = rayon::current_num_threads(),
            "Starting parallel experiment"
        );
        let start = Instant::now();
        let completed = AtomicUsize::new(0);

        let totals = (0..self.trials)
            .into_par_iter()
            .map(|trial| -> Result<Totals, SimulationError> {
                let mut testbed = self.testbed.fork(trial as u64);
                let mut agents: Vec<EpsilonGreedy> = self
                    .agents
                    .iter()
                    .map(|agent| agent.fork(trial as u64))
                    .collect();
                let mut totals = Totals::new(self.steps, self.agents.len());
                play_trial(&mut testbed, &mut agents, self.steps, &mut totals)?;

                let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
                if done % self.report_every == 0 {
                    info!(completed = done, "Completed trials");
                }
                Ok(totals)
            })
            .try_reduce(
                || Totals::new(self.steps, self.agents.len()),
                |a, b| Ok(a.merge(b)),
            )?;

        info!(elapsed = ?start.elapsed(), "Finished parallel experiment");
        Ok(self.results(totals))
    }

    fn results(&self, totals: Totals) -> ExperimentResults {
        let (average_rewards, optimal_action_fraction) = totals.into_tables(self.trials);
        ExperimentResults {
            labels: self.labels(),
            average_rewards,
            optimal_action_fraction,
        }
    }
}

fn play_trial(
    testbed: &mut Testbed,
    agents: &mut [EpsilonGreedy],
    steps: usize,
    totals: &mut Totals,
) -> Result<(), SimulationError> {
    testbed.reset();
    agents.iter_mut().for_each(EpsilonGreedy::reset);
    debug!(optimal_arm = testbed.optimal_arm(), "Starting trial");

    for step in 0..steps {
        for (index, agent) in agents.iter_mut().enumerate() {
            let action = agent.select_action();
            let reward = testbed.sample(action)?;
            agent.update(reward)?;
            totals.record(step, index, reward, action == testbed.optimal_arm());
        }
    }

    Ok(())
}
