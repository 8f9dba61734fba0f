//! Actor-Critic configuration and hyperparameters
//!
//! The original research scripts kept these as process-wide globals; here
//! they are immutable config structs handed to the learner constructors.

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

/// Configuration for the sequential two-optimizer agent
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct A2cConfig {
    /// Observation vector length
    pub obs_dim: i64,

    /// Number of discrete actions
    pub num_actions: i64,

    /// Learning rate of the actor's optimizer
    pub actor_lr: f64,

    /// Learning rate of the critic's optimizer
    pub critic_lr: f64,

    /// Discount factor
    pub gamma: f64,

    /// Seed for action sampling and parameter init
    pub seed: i64,
}

impl Default for A2cConfig {
    fn default() -> Self {
        Self { obs_dim: 4, num_actions: 16, actor_lr: 0.01, critic_lr: 0.01, gamma: 0.99, seed: 0 }
    }
}

impl A2cConfig {
    /// Create a new default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate configuration parameters
    pub fn validate(&self) -> Result<()> {
        if self.obs_dim <= 0 {
            return Err(anyhow!("obs_dim must be positive"));
        }
        if self.num_actions <= 0 {
            return Err(anyhow!("num_actions must be positive"));
        }
        if self.actor_lr <= 0.0 || self.critic_lr <= 0.0 {
            return Err(anyhow!("learning rates must be positive"));
        }
        if !(0.0..=1.0).contains(&self.gamma) {
            return Err(anyhow!("gamma must be in [0, 1]"));
        }
        Ok(())
    }

    /// Set the observation dimension
    pub fn obs_dim(mut self, dim: i64) -> Self {
        self.obs_dim = dim;
        self
    }

    /// Set the number of discrete actions
    pub fn num_actions(mut self, n: i64) -> Self {
        self.num_actions = n;
        self
    }

    /// Set the actor learning rate
    pub fn actor_lr(mut self, lr: f64) -> Self {
        self.actor_lr = lr;
        self
    }

    /// Set the critic learning rate
    pub fn critic_lr(mut self, lr: f64) -> Self {
        self.critic_lr = lr;
        self
    }

    /// Set the discount factor
    pub fn gamma(mut self, gamma: f64) -> Self {
        self.gamma = gamma;
        self
    }

    /// Set the sampling seed
    pub fn seed(mut self, seed: i64) -> Self {
        self.seed = seed;
        self
    }
}

/// Configuration for the batched single-optimizer learner
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MultiA2cConfig {
    /// Observation vector length
    pub obs_dim: i64,

    /// Number of discrete actions
    pub num_actions: i64,

    /// Learning rate of the shared optimizer
    pub learning_rate: f64,

    /// Discount factor
    pub gamma: f64,

    /// Weight of the value term in the combined loss
    pub vf_coef: f64,

    /// Weight of the entropy bonus in the combined loss
    pub ent_coef: f64,

    /// Seed for action sampling and parameter init
    pub seed: i64,
}

impl Default for MultiA2cConfig {
    fn default() -> Self {
        Self {
            obs_dim: 4,
            num_actions: 2,
            learning_rate: 1e-4,
            gamma: 0.99,
            vf_coef: 0.5,
            ent_coef: 0.01,
            seed: 0,
        }
    }
}

impl MultiA2cConfig {
    /// Create a new default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate configuration parameters
    pub fn validate(&self) -> Result<()> {
        if self.obs_dim <= 0 {
            return Err(anyhow!("obs_dim must be positive"));
        }
        if self.num_actions <= 0 {
            return Err(anyhow!("num_actions must be positive"));
        }
        if self.learning_rate <= 0.0 {
            return Err(anyhow!("learning_rate must be positive"));
        }
        if !(0.0..=1.0).contains(&self.gamma) {
            return Err(anyhow!("gamma must be in [0, 1]"));
        }
        if self.vf_coef < 0.0 {
            return Err(anyhow!("vf_coef must be non-negative"));
        }
        if self.ent_coef < 0.0 {
            return Err(anyhow!("ent_coef must be non-negative"));
        }
        Ok(())
    }

    /// Set the observation dimension
    pub fn obs_dim(mut self, dim: i64) -> Self {
        self.obs_dim = dim;
        self
    }

    /// Set the number of discrete actions
    pub fn num_actions(mut self, n: i64) -> Self {
        self.num_actions = n;
        self
    }

    /// Set the learning rate
    pub fn learning_rate(mut self, lr: f64) -> Self {
        self.learning_rate = lr;
        self
    }

    /// Set the discount factor
    pub fn gamma(mut self, gamma: f64) -> Self {
        self.gamma = gamma;
        self
    }

    /// Set the value-loss weight
    pub fn vf_coef(mut self, coef: f64) -> Self {
        self.vf_coef = coef;
        self
    }

    /// Set the entropy-bonus weight
    pub fn ent_coef(mut self, coef: f64) -> Self {
        self.ent_coef = coef;
        self
    }

    /// Set the sampling seed
    pub fn seed(mut self, seed: i64) -> Self {
        self.seed = seed;
        self
    }
}
