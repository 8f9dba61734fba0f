//! Sequential Actor-Critic agent
//!
//! One environment, one transition per update. The actor and critic are
//! separate networks with separate parameter stores, each updated through
//! its own Adam optimizer: the critic regresses on the TD target first,
//! then the actor takes a policy-gradient step scaled by the TD error.
//!
//! The TD error handed to the actor is detached from the critic's graph.
//! The reference implementation backpropagated the actor loss through the
//! same undetached tensor that fed the critic loss; that coupling lets the
//! policy step reach critic parameters and does not match the standard
//! Actor-Critic formulation, so this implementation severs it (see
//! DESIGN.md).

use anyhow::{bail, Result};
use tch::{
    nn::{self, OptimizerConfig},
    Kind, Tensor,
};

use super::{config::A2cConfig, loss, stats::UpdateStats};
use crate::policy::towers::{ActorNet, CriticNet};

/// Actor-Critic learner over separate actor/critic networks
pub struct A2cAgent {
    config: A2cConfig,
    actor: ActorNet,
    critic: CriticNet,
    actor_opt: nn::Optimizer,
    critic_opt: nn::Optimizer,
    updates: usize,
}

impl A2cAgent {
    /// Build the networks and their optimizers
    pub fn new(config: A2cConfig) -> Result<Self> {
        config.validate()?;
        tch::manual_seed(config.seed);

        let actor = ActorNet::new(config.obs_dim, config.num_actions);
        let critic = CriticNet::new(config.obs_dim);
        let actor_opt = nn::Adam::default().build(actor.var_store(), config.actor_lr)?;
        let critic_opt = nn::Adam::default().build(critic.var_store(), config.critic_lr)?;

        tracing::info!(device = ?actor.device(), "A2C agent initialized");

        Ok(Self { config, actor, critic, actor_opt, critic_opt, updates: 0 })
    }

    /// Sample an action for a single observation
    ///
    /// Wraps the state into a batch of one, runs the actor, and samples from
    /// the categorical distribution over its softmax output. Returns the
    /// sampled index and the full probability vector. With a fixed seed,
    /// fixed parameters and fixed input, the sample is deterministic.
    pub fn choose_action(&self, state: &[f32]) -> Result<(i64, Vec<f32>)> {
        if state.len() as i64 != self.config.obs_dim {
            bail!("expected a {}-dimensional state, got {}", self.config.obs_dim, state.len());
        }

        let obs = Tensor::from_slice(state).unsqueeze(0).to_device(self.actor.device());
        let probs = self.actor.forward(&obs).softmax(-1, Kind::Float);
        let action = probs.multinomial(1, true).int64_value(&[0, 0]);
        let probs: Vec<f32> = Vec::try_from(probs.squeeze_dim(0).to_device(tch::Device::Cpu))?;

        Ok((action, probs))
    }

    /// One Actor-Critic update from a single transition
    ///
    /// Computes `target = reward + gamma * critic(next_state)` (bootstrap
    /// taken without gradient), steps the critic on the squared TD error,
    /// then steps the actor on `-log π(action|state) * td_error` with the
    /// detached TD error as the advantage.
    pub fn learn(
        &mut self,
        reward: f32,
        state: &[f32],
        next_state: &[f32],
        action: i64,
    ) -> Result<UpdateStats> {
        if action < 0 || action >= self.config.num_actions {
            bail!("action {} outside [0, {})", action, self.config.num_actions);
        }

        let device = self.critic.device();
        let obs = Tensor::from_slice(state).unsqueeze(0).to_device(device);
        let next_obs = Tensor::from_slice(next_state).unsqueeze(0).to_device(device);

        let target =
            tch::no_grad(|| self.critic.forward(&next_obs)) * self.config.gamma + reward as f64;

        // Critic first: regression toward the bootstrap target.
        let value = self.critic.forward(&obs);
        let critic_loss = loss::critic_loss(&value, &target);
        self.critic_opt.backward_step(&critic_loss);

        // Then the actor, with the pre-update TD error as its advantage.
        let td_error = &target - value.detach();
        let logits = self.actor.forward(&obs);
        let log_probs_all = logits.log_softmax(-1, Kind::Float);
        let action_t = Tensor::from_slice(&[action]).to_device(device);
        let log_prob = log_probs_all.gather(-1, &action_t.unsqueeze(-1), false).squeeze_dim(-1);
        let actor_loss = loss::actor_loss(&log_prob, &td_error);
        self.actor_opt.backward_step(&actor_loss);

        let entropy = -(log_probs_all.exp() * &log_probs_all)
            .sum_dim_intlist(-1, false, Kind::Float)
            .mean(Kind::Float);

        let actor_loss = f64::try_from(&actor_loss)?;
        let critic_loss = f64::try_from(&critic_loss)?;
        let entropy = f64::try_from(&entropy)?;
        self.updates += 1;

        Ok(UpdateStats::new(actor_loss, critic_loss, entropy, actor_loss + critic_loss))
    }

    /// Number of completed `learn` calls
    pub fn updates(&self) -> usize {
        self.updates
    }

    /// The configuration this agent was built with
    pub fn config(&self) -> &A2cConfig {
        &self.config
    }

    /// Save both parameter stores next to each other
    ///
    /// `prefix` is extended to `<prefix>.actor.pt` and `<prefix>.critic.pt`.
    pub fn save<P: AsRef<std::path::Path>>(&self, prefix: P) -> Result<()> {
        let prefix = prefix.as_ref();
        self.actor.save(tower_path(prefix, "actor"))?;
        self.critic.save(tower_path(prefix, "critic"))?;
        Ok(())
    }

    /// Load both parameter stores saved by [`A2cAgent::save`]
    ///
    /// Fails immediately if either file is missing or its shapes do not
    /// match the current architecture.
    pub fn load<P: AsRef<std::path::Path>>(&mut self, prefix: P) -> Result<()> {
        let prefix = prefix.as_ref();
        self.actor.load(tower_path(prefix, "actor"))?;
        self.critic.load(tower_path(prefix, "critic"))?;
        Ok(())
    }
}

fn tower_path(prefix: &std::path::Path, tower: &str) -> std::path::PathBuf {
    let mut name = prefix.as_os_str().to_os_string();
    name.push(format!(".{}.pt", tower));
    std::path::PathBuf::from(name)
}
