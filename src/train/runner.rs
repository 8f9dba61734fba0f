//! Training-loop orchestration
//!
//! Two drivers, one per learner variant:
//!
//! - [`run_episodes`]: sequential, one environment — observe, act, step,
//!   learn, until the episode ends; repeat for a configured episode count.
//! - [`run_vectorized`]: batched — act on the whole batch, step the
//!   [`ParallelEnv`], bootstrap the next values without gradient, update.
//!
//! Both log progress through `tracing`, save timestamped checkpoints on a
//! configurable cadence, and return the collected episode rewards so the
//! caller can persist or plot them.

use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use tch::{Device, Tensor};

use crate::env::{vector::ParallelEnv, Environment};
use crate::train::a2c::{A2cAgent, MultiA2c, Transition};
use crate::utils::episodes::EpisodeTracker;

/// Knobs for the training drivers
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Episode count for the sequential driver
    pub episodes: usize,

    /// Iteration count for the vectorized driver
    pub total_steps: usize,

    /// Log every N episodes (sequential) or N iterations (vectorized);
    /// 0 disables progress logs
    pub log_interval: usize,

    /// Checkpoint every N episodes/iterations; 0 disables checkpoints
    pub checkpoint_interval: usize,

    /// Directory checkpoints are written into; `None` disables checkpoints
    pub model_dir: Option<PathBuf>,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            episodes: 1000,
            total_steps: 100_000,
            log_interval: 10,
            checkpoint_interval: 1000,
            model_dir: None,
        }
    }
}

impl RunnerConfig {
    /// Create a new default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the sequential episode count
    pub fn episodes(mut self, episodes: usize) -> Self {
        self.episodes = episodes;
        self
    }

    /// Set the vectorized iteration count
    pub fn total_steps(mut self, steps: usize) -> Self {
        self.total_steps = steps;
        self
    }

    /// Set the progress-log cadence
    pub fn log_interval(mut self, interval: usize) -> Self {
        self.log_interval = interval;
        self
    }

    /// Set the checkpoint cadence
    pub fn checkpoint_interval(mut self, interval: usize) -> Self {
        self.checkpoint_interval = interval;
        self
    }

    /// Set the checkpoint directory
    pub fn model_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.model_dir = Some(dir.into());
        self
    }

    fn due(&self, interval: usize, index: usize) -> bool {
        interval > 0 && (index + 1) % interval == 0
    }
}

/// Timestamped checkpoint path: `<dir>/<tag>_<YYYYmmdd-HHMMSS>_<episode>`
///
/// The learner's `save` appends its own file extension(s).
pub fn checkpoint_path(dir: &Path, tag: &str, episode: usize) -> PathBuf {
    let stamp = chrono::Local::now().format("%Y%m%d-%H%M%S");
    dir.join(format!("{}_{}_{:05}", tag, stamp, episode))
}

/// Train a sequential agent for `config.episodes` episodes
///
/// Returns the cumulative reward of every episode.
pub fn run_episodes<E>(agent: &mut A2cAgent, env: &mut E, config: &RunnerConfig) -> Result<Vec<f32>>
where
    E: Environment<Observation = Vec<f32>, Action = i64>,
{
    let mut history = Vec::with_capacity(config.episodes);

    for episode in 0..config.episodes {
        let mut state = env.reset()?;
        let mut cumulative = 0.0_f32;
        let mut steps = 0_usize;

        loop {
            let (action, _probs) = agent.choose_action(&state)?;
            let result = env.step(action)?;
            agent.learn(result.reward, &state, &result.observation, action)?;

            cumulative += result.reward;
            steps += 1;
            let done = result.done();
            state = result.observation;
            if done {
                break;
            }
        }
        history.push(cumulative);

        if config.due(config.log_interval, episode) {
            tracing::info!(
                "episode {}/{} | steps {} | reward {:.1}",
                episode + 1,
                config.episodes,
                steps,
                cumulative,
            );
        }

        if let Some(dir) = &config.model_dir {
            if config.due(config.checkpoint_interval, episode) {
                let path = checkpoint_path(dir, "a2c_agent", episode + 1);
                agent.save(&path)?;
                tracing::info!("checkpoint saved: {}", path.display());
            }
        }
    }

    Ok(history)
}

/// Train a batched learner against a [`ParallelEnv`] for
/// `config.total_steps` iterations
///
/// Returns the totals of every episode that finished during the run.
pub fn run_vectorized(
    agent: &mut MultiA2c,
    penv: &mut ParallelEnv,
    config: &RunnerConfig,
) -> Result<Vec<f32>> {
    let device = agent.device();
    let obs_dim = agent.config().obs_dim;
    let mut tracker = EpisodeTracker::new(penv.num_envs());

    let mut states = batch_to_tensor(&penv.reset()?, obs_dim, device)?;

    for step in 0..config.total_steps {
        let (actions, log_probs, entropy, values) = agent.act(&states);
        let actions: Vec<i64> = Vec::try_from(actions.to_device(Device::Cpu))?;

        let (next_observations, rewards, dones) = penv.step(&actions)?;
        let next_states = batch_to_tensor(&next_observations, obs_dim, device)?;
        let next_values = agent.values(&next_states);

        let transition =
            Transition::from_step(&rewards, &dones, log_probs, entropy, values, next_values, device);
        let loss = agent.update(&transition)?;

        tracker.record(&rewards, &dones);
        states = next_states;

        if config.due(config.log_interval, step) {
            tracing::info!(
                "step {}/{} | episodes {} | last episode reward {:.1} | loss {:.4}",
                step + 1,
                config.total_steps,
                tracker.episodes(),
                tracker.last_completed().unwrap_or(0.0),
                loss,
            );
        }

        if let Some(dir) = &config.model_dir {
            if config.due(config.checkpoint_interval, step) {
                let path = checkpoint_path(dir, "multi_a2c", step + 1);
                agent.save(&path)?;
                tracing::info!("checkpoint saved: {}", path.display());
            }
        }
    }

    Ok(tracker.completed().to_vec())
}

/// Stack an `N × obs_dim` batch of observations into one tensor
fn batch_to_tensor(batch: &[Vec<f32>], obs_dim: i64, device: Device) -> Result<Tensor> {
    let flat: Vec<f32> = batch.iter().flatten().copied().collect();
    if flat.len() as i64 != batch.len() as i64 * obs_dim {
        bail!("expected {}-dimensional observations from every slot", obs_dim);
    }
    Ok(Tensor::from_slice(&flat).view([batch.len() as i64, obs_dim]).to_device(device))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::cartpole::CartPole;
    use crate::train::a2c::{A2cConfig, MultiA2cConfig};

    #[test]
    fn checkpoint_path_embeds_tag_and_episode() {
        let path = checkpoint_path(Path::new("/tmp/models"), "a2c_agent", 42);
        let name = path.file_name().unwrap().to_string_lossy().into_owned();

        assert!(name.starts_with("a2c_agent_"));
        assert!(name.ends_with("_00042"));
    }

    #[test]
    fn cadence_checks_respect_zero_as_disabled() {
        let config = RunnerConfig::new().log_interval(0).checkpoint_interval(5);
        assert!(!config.due(config.log_interval, 0));
        assert!(config.due(config.checkpoint_interval, 4));
        assert!(!config.due(config.checkpoint_interval, 5));
    }

    #[test]
    fn batch_to_tensor_stacks_rows() {
        let batch = vec![vec![1.0, 2.0], vec![3.0, 4.0], vec![5.0, 6.0]];
        let tensor = batch_to_tensor(&batch, 2, Device::Cpu).unwrap();
        assert_eq!(tensor.size(), vec![3, 2]);

        let row: Vec<f32> = Vec::try_from(tensor.get(1)).unwrap();
        assert_eq!(row, vec![3.0, 4.0]);
    }

    #[test]
    fn batch_to_tensor_rejects_ragged_rows() {
        let batch = vec![vec![1.0, 2.0], vec![3.0]];
        assert!(batch_to_tensor(&batch, 2, Device::Cpu).is_err());
    }

    #[test]
    fn sequential_driver_completes_and_reports_every_episode() {
        let config = A2cConfig::new().obs_dim(4).num_actions(2).seed(1);
        let mut agent = A2cAgent::new(config).unwrap();
        let mut env = CartPole::with_seed(1);

        let runner = RunnerConfig::new().episodes(3).log_interval(0);
        let history = run_episodes(&mut agent, &mut env, &runner).unwrap();

        assert_eq!(history.len(), 3);
        // CartPole pays +1 per survived step, so every episode banks > 0.
        assert!(history.iter().all(|&r| r >= 1.0));
    }

    #[test]
    fn vectorized_driver_runs_for_the_configured_steps() {
        let config = MultiA2cConfig::new().obs_dim(4).num_actions(2).seed(2);
        let mut agent = MultiA2c::new(config).unwrap();
        let mut penv = ParallelEnv::new(4, || CartPole::with_seed(2)).unwrap();

        let runner = RunnerConfig::new().total_steps(25).log_interval(0);
        run_vectorized(&mut agent, &mut penv, &runner).unwrap();

        assert_eq!(agent.updates(), 25);
    }
}
