//! Train the sequential A2C agent on the move-to-beacon mini-game
//!
//! One environment, separate actor/critic networks, two optimizers. Picks
//! up the latest saved model if one exists, checkpoints periodically while
//! training, and writes the per-episode reward history to JSON at the end.
//!
//! # Usage
//!
//! ```bash
//! cargo run --example train_beacon --release
//! ```

use anyhow::Result;

use advantage_rl::env::beacon::{BeaconEnv, NUM_ACTIONS};
use advantage_rl::train::a2c::{A2cAgent, A2cConfig};
use advantage_rl::train::runner::{run_episodes, RunnerConfig};

const EPISODES: usize = 10_000;
const MODEL_DIR: &str = "models";
const LATEST: &str = "models/a2c_agent_latest";

fn main() -> Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    tracing::info!("training A2C on the move-to-beacon mini-game");

    let config = A2cConfig::new().num_actions(NUM_ACTIONS as i64);
    let mut agent = A2cAgent::new(config)?;

    // Resume from the last run if its model is on disk.
    if std::path::Path::new(&format!("{}.actor.pt", LATEST)).exists() {
        agent.load(LATEST)?;
        tracing::info!("resumed from {}", LATEST);
    }

    std::fs::create_dir_all(MODEL_DIR)?;
    let runner = RunnerConfig::new()
        .episodes(EPISODES)
        .log_interval(10)
        .checkpoint_interval(1000)
        .model_dir(MODEL_DIR);

    let mut env = BeaconEnv::new();
    let history = run_episodes(&mut agent, &mut env, &runner)?;

    agent.save(LATEST)?;
    tracing::info!("model saved to {}", LATEST);

    let history_path = "beacon_rewards.json";
    serde_json::to_writer(std::fs::File::create(history_path)?, &history)?;
    tracing::info!("reward history written to {}", history_path);

    let best = history.iter().cloned().fold(f32::MIN, f32::max);
    tracing::info!("training complete | episodes {} | best reward {:.1}", history.len(), best);

    Ok(())
}
