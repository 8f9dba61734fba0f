//! # advantage-rl
//!
//! Advantage Actor-Critic training in Rust, with neural networks and
//! automatic differentiation supplied by PyTorch via tch-rs.
//!
//! Two learner setups are provided:
//!
//! - a sequential agent ([`train::a2c::A2cAgent`]) with separate actor and
//!   critic networks and one optimizer each, updated from a single
//!   transition at a time;
//! - a batched learner ([`train::a2c::MultiA2c`]) with one two-tower
//!   network and a single optimizer, updated from the lockstep transitions
//!   of a [`env::vector::ParallelEnv`].
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use advantage_rl::prelude::*;
//!
//! # fn main() -> anyhow::Result<()> {
//! let config = MultiA2cConfig::new().obs_dim(4).num_actions(2);
//! let mut agent = MultiA2c::new(config)?;
//! let mut penv = ParallelEnv::new(8, CartPole::new)?;
//!
//! let runner = RunnerConfig::new().total_steps(10_000);
//! let rewards = run_vectorized(&mut agent, &mut penv, &runner)?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Environment trait, built-in environments, and the vectorized driver
pub mod env;

/// Policy and value networks
pub mod policy;

/// Learners and training-loop drivers
pub mod train;

/// Utility helpers
pub mod utils;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::env::beacon::BeaconEnv;
    pub use crate::env::cartpole::CartPole;
    pub use crate::env::vector::ParallelEnv;
    pub use crate::env::Environment;
    pub use crate::train::a2c::{A2cAgent, A2cConfig, MultiA2c, MultiA2cConfig};
    pub use crate::train::runner::{run_episodes, run_vectorized, RunnerConfig};
}

/// Current version of advantage-rl
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert_eq!(VERSION, "0.1.0");
    }
}
