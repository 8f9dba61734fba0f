//! Train the batched A2C learner on CartPole with parallel environments
//!
//! Eight CartPole instances run on worker threads behind a `ParallelEnv`;
//! every iteration takes one batched step and one combined-loss gradient
//! update. Finished-episode totals are written to JSON at the end.
//!
//! # Usage
//!
//! ```bash
//! cargo run --example train_cartpole_multi --release
//! ```

use anyhow::Result;

use advantage_rl::env::cartpole::CartPole;
use advantage_rl::env::vector::ParallelEnv;
use advantage_rl::env::Environment;
use advantage_rl::train::a2c::{MultiA2c, MultiA2cConfig};
use advantage_rl::train::runner::{run_vectorized, RunnerConfig};

const NUM_ENVS: usize = 8;
const TOTAL_STEPS: usize = 100_000;

fn main() -> Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    // Read the space sizes off a scratch instance, as the training batch
    // only exists behind the vectorized driver.
    let probe = CartPole::new();
    let obs_dim = probe.observation_space().shape[0] as i64;
    let num_actions = match probe.action_space().dtype {
        advantage_rl::env::SpaceType::Discrete(n) => n as i64,
        _ => anyhow::bail!("expected a discrete action space"),
    };
    drop(probe);

    tracing::info!(
        "training multi-environment A2C on CartPole | envs {} | steps {}",
        NUM_ENVS,
        TOTAL_STEPS,
    );

    let config = MultiA2cConfig::new().obs_dim(obs_dim).num_actions(num_actions);
    let mut agent = MultiA2c::new(config)?;
    let mut penv = ParallelEnv::new(NUM_ENVS, CartPole::new)?;

    std::fs::create_dir_all("models")?;
    let runner = RunnerConfig::new()
        .total_steps(TOTAL_STEPS)
        .log_interval(500)
        .checkpoint_interval(20_000)
        .model_dir("models");

    let rewards = run_vectorized(&mut agent, &mut penv, &runner)?;
    penv.close();

    let model_path = "models/multi_a2c_latest.pt";
    agent.save(model_path)?;
    tracing::info!("model saved to {}", model_path);

    let history_path = "cartpole_rewards.json";
    serde_json::to_writer(std::fs::File::create(history_path)?, &rewards)?;
    tracing::info!("episode rewards written to {}", history_path);

    let best = rewards.iter().cloned().fold(0.0_f32, f32::max);
    tracing::info!("training complete | episodes {} | best reward {:.1}", rewards.len(), best);

    Ok(())
}
