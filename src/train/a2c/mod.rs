//! Advantage Actor-Critic
//!
//! Two learner variants share this module:
//!
//! - [`A2cAgent`]: one environment at a time, separate actor/critic
//!   networks, two optimizers, one `learn` call per transition.
//! - [`MultiA2c`]: a batch of parallel environments, one two-tower network,
//!   a single optimizer, one combined-loss `update` per batched transition.

pub mod agent;
pub mod config;
pub mod loss;
pub mod multi;
pub mod stats;

pub use agent::A2cAgent;
pub use config::{A2cConfig, MultiA2cConfig};
pub use multi::{MultiA2c, Transition};
pub use stats::UpdateStats;
