//! Batched Actor-Critic learner
//!
//! Operates on a batch of `nenv` parallel transitions at once: the policy
//! and value towers share one parameter store, a single Adam optimizer
//! covers both, and each `update` takes one gradient step on the combined
//! scalar loss `policy + vf_coef * value - ent_coef * entropy`.

use anyhow::Result;
use tch::{nn, Device, Tensor};

use super::{config::MultiA2cConfig, loss};
use crate::policy::mlp::PolicyValueNet;

/// One batched transition, consumed immediately by [`MultiA2c::update`]
///
/// All tensors are `[nenv]`-shaped except `entropy`, which is the scalar
/// mean entropy of the acting distributions. `log_prob`, `entropy` and
/// `value` must come from the acting forward pass so gradient can flow
/// back through them; `next_value` must not carry gradient.
pub struct Transition {
    /// Reward observed for the step
    pub reward: Tensor,

    /// 1.0 where the step terminated the episode, else 0.0
    pub done: Tensor,

    /// Log-probability of the action actually taken
    pub log_prob: Tensor,

    /// Mean entropy of the acting distributions
    pub entropy: Tensor,

    /// Value estimate of the state the action was taken in
    pub value: Tensor,

    /// Value estimate of the resulting state (no gradient)
    pub next_value: Tensor,
}

impl Transition {
    /// Assemble a transition from the driver's step output and the acting
    /// tensors
    pub fn from_step(
        rewards: &[f32],
        dones: &[bool],
        log_prob: Tensor,
        entropy: Tensor,
        value: Tensor,
        next_value: Tensor,
        device: Device,
    ) -> Self {
        let done_flags: Vec<f32> = dones.iter().map(|&d| if d { 1.0 } else { 0.0 }).collect();
        Self {
            reward: Tensor::from_slice(rewards).to_device(device),
            done: Tensor::from_slice(&done_flags).to_device(device),
            log_prob,
            entropy,
            value,
            next_value,
        }
    }
}

/// Actor-Critic learner over a batch of parallel environments
pub struct MultiA2c {
    config: MultiA2cConfig,
    net: PolicyValueNet,
    optimizer: nn::Optimizer,
    updates: usize,
}

impl MultiA2c {
    /// Build the network and its optimizer
    pub fn new(config: MultiA2cConfig) -> Result<Self> {
        config.validate()?;
        tch::manual_seed(config.seed);

        let net = PolicyValueNet::new(config.obs_dim, config.num_actions);
        let optimizer = net.optimizer(config.learning_rate)?;

        tracing::info!(device = ?net.device(), "multi-environment A2C initialized");

        Ok(Self { config, net, optimizer, updates: 0 })
    }

    /// Sample one action per environment
    ///
    /// `states` is `[nenv, obs_dim]`. Returns `(actions, log_probs,
    /// entropy, values)`; everything but the action indices carries
    /// gradient for the following [`update`](MultiA2c::update).
    pub fn act(&self, states: &Tensor) -> (Tensor, Tensor, Tensor, Tensor) {
        self.net.get_action(states)
    }

    /// Bootstrap values for a batch of states, without gradient
    pub fn values(&self, states: &Tensor) -> Tensor {
        tch::no_grad(|| self.net.forward(states).1)
    }

    /// Log-probabilities, entropy and values for given state/action pairs
    pub fn evaluate_actions(&self, states: &Tensor, actions: &Tensor) -> (Tensor, Tensor, Tensor) {
        self.net.evaluate_actions(states, actions)
    }

    /// One combined-loss gradient step over a batched transition
    ///
    /// The TD target bootstraps `next_value` for live slots and collapses
    /// to the bare reward where `done` is set. The advantage scaling the
    /// policy term is detached, so the policy gradient cannot reach the
    /// value tower through it. Returns the scalar combined loss.
    pub fn update(&mut self, transition: &Transition) -> Result<f64> {
        let target = loss::td_target(
            &transition.reward,
            &transition.next_value,
            &transition.done,
            self.config.gamma,
        );
        let advantage = &target - &transition.value;

        let value_loss = advantage.square().mean(tch::Kind::Float);
        let policy_loss = loss::actor_loss(&transition.log_prob, &advantage.detach());
        let total = loss::combined_loss(
            &policy_loss,
            &value_loss,
            &transition.entropy,
            self.config.vf_coef,
            self.config.ent_coef,
        );

        self.optimizer.backward_step(&total);
        self.updates += 1;

        Ok(f64::try_from(&total)?)
    }

    /// Number of completed `update` calls
    pub fn updates(&self) -> usize {
        self.updates
    }

    /// The configuration this learner was built with
    pub fn config(&self) -> &MultiA2cConfig {
        &self.config
    }

    /// Device the parameters live on
    pub fn device(&self) -> Device {
        self.net.device()
    }

    /// Save the parameter store to a file
    pub fn save<P: AsRef<std::path::Path>>(&self, path: P) -> Result<()> {
        self.net.save(path)
    }

    /// Load a parameter store saved by [`MultiA2c::save`]
    pub fn load<P: AsRef<std::path::Path>>(&mut self, path: P) -> Result<()> {
        self.net.load(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tch::Kind;

    fn learner() -> MultiA2c {
        MultiA2c::new(MultiA2cConfig::new().obs_dim(4).num_actions(2).seed(5)).unwrap()
    }

    #[test]
    fn act_shapes_match_the_batch() {
        let agent = learner();
        let states = Tensor::randn([8, 4], (Kind::Float, agent.device()));

        let (actions, log_probs, entropy, values) = agent.act(&states);
        assert_eq!(actions.size(), vec![8]);
        assert_eq!(log_probs.size(), vec![8]);
        assert_eq!(entropy.size(), Vec::<i64>::new());
        assert_eq!(values.size(), vec![8]);
    }

    #[test]
    fn bootstrap_values_carry_no_gradient() {
        let agent = learner();
        let states = Tensor::randn([4, 4], (Kind::Float, agent.device()));

        let values = agent.values(&states);
        assert!(!values.requires_grad());
    }

    #[test]
    fn update_returns_a_finite_loss() {
        let mut agent = learner();
        let states = Tensor::randn([4, 4], (Kind::Float, agent.device()));
        let next_states = Tensor::randn([4, 4], (Kind::Float, agent.device()));

        let (_, log_probs, entropy, values) = agent.act(&states);
        let next_values = agent.values(&next_states);
        let transition = Transition::from_step(
            &[1.0; 4],
            &[false; 4],
            log_probs,
            entropy,
            values,
            next_values,
            agent.device(),
        );

        let total = agent.update(&transition).unwrap();
        assert!(total.is_finite());
        assert_eq!(agent.updates(), 1);
    }

    #[test]
    fn done_flags_become_mask_values() {
        let transition = Transition::from_step(
            &[0.0, 0.0],
            &[true, false],
            Tensor::zeros([2], (Kind::Float, Device::Cpu)),
            Tensor::from(0.0_f32),
            Tensor::zeros([2], (Kind::Float, Device::Cpu)),
            Tensor::zeros([2], (Kind::Float, Device::Cpu)),
            Device::Cpu,
        );

        let flags: Vec<f32> = Vec::try_from(transition.done).unwrap();
        assert_eq!(flags, vec![1.0, 0.0]);
    }

    #[test]
    fn repeated_updates_shrink_the_loss() {
        // Evaluate a fixed action set on a fixed batch each round; with a
        // zero discount the value target is pinned at the rewards, so the
        // combined loss has a stationary optimum to descend toward.
        let mut agent = MultiA2c::new(
            MultiA2cConfig::new()
                .obs_dim(4)
                .num_actions(2)
                .learning_rate(1e-2)
                .gamma(0.0)
                .ent_coef(0.0)
                .seed(5),
        )
        .unwrap();

        let states = Tensor::randn([8, 4], (Kind::Float, agent.device()));
        let actions = Tensor::randint(2, [8], (Kind::Int64, agent.device()));
        let rewards = [1.0_f32; 8];
        let dones = [false; 8];

        let step = |agent: &mut MultiA2c, states: &Tensor, actions: &Tensor| -> f64 {
            let (log_probs, entropy, values) = agent.evaluate_actions(states, actions);
            let next_values = agent.values(states);
            let transition = Transition::from_step(
                &rewards,
                &dones,
                log_probs,
                entropy,
                values,
                next_values,
                agent.device(),
            );
            agent.update(&transition).unwrap()
        };

        let first = step(&mut agent, &states, &actions);
        let mut last = first;
        for _ in 0..200 {
            last = step(&mut agent, &states, &actions);
        }

        assert!(last < first, "combined loss should fall: {} -> {}", first, last);
    }
}
