//! Two-tower policy/value network over a single parameter store
//!
//! The batched learner takes one gradient step over every parameter at
//! once, so both towers hang off the same `nn::VarStore`:
//!
//! ```text
//! Input (observations)
//!      /                \
//! [Dense(128)] - ReLU   [Dense(128)] - LayerNorm - ReLU
//!      |                 |
//! [Dense(128)] - ReLU   [Dense(128)] - LayerNorm - ReLU
//!      |                 |
//! [Dense(out)]          [Dense(1)]
//!      |                 |
//!  Action logits       State value
//! ```
//!
//! The layer-normalized value tower keeps the value regression stable when
//! per-step updates arrive from many environments at once. Initialization
//! matches the separate-tower networks: orthogonal variance-scaling weights
//! and 0.01 constant biases.

use anyhow::Result;
use tch::{
    nn::{self, Init, Module, OptimizerConfig},
    Device, Kind, Tensor,
};

const HIDDEN: i64 = 128;

fn linear_config(gain: f64) -> nn::LinearConfig {
    nn::LinearConfig {
        ws_init: Init::Orthogonal { gain },
        bs_init: Some(Init::Const(0.01)),
        ..Default::default()
    }
}

/// Policy and value towers sharing one parameter store
pub struct PolicyValueNet {
    vs: nn::VarStore,
    policy: nn::Sequential,
    value: nn::Sequential,
    device: Device,
}

impl PolicyValueNet {
    /// Build a network for `obs_dim`-dimensional observations and
    /// `num_actions` discrete actions
    pub fn new(obs_dim: i64, num_actions: i64) -> Self {
        let vs = nn::VarStore::new(Device::cuda_if_available());
        let root = vs.root();
        let relu_gain = 2.0_f64.sqrt();

        let policy = nn::seq()
            .add(nn::linear(&root / "policy" / "fc1", obs_dim, HIDDEN, linear_config(relu_gain)))
            .add_fn(|x| x.relu())
            .add(nn::linear(&root / "policy" / "fc2", HIDDEN, HIDDEN, linear_config(relu_gain)))
            .add_fn(|x| x.relu())
            .add(nn::linear(&root / "policy" / "out", HIDDEN, num_actions, linear_config(0.01)));

        let value = nn::seq()
            .add(nn::linear(&root / "value" / "fc1", obs_dim, HIDDEN, linear_config(relu_gain)))
            .add(nn::layer_norm(&root / "value" / "ln1", vec![HIDDEN], Default::default()))
            .add_fn(|x| x.relu())
            .add(nn::linear(&root / "value" / "fc2", HIDDEN, HIDDEN, linear_config(relu_gain)))
            .add(nn::layer_norm(&root / "value" / "ln2", vec![HIDDEN], Default::default()))
            .add_fn(|x| x.relu())
            .add(nn::linear(&root / "value" / "out", HIDDEN, 1, linear_config(0.01)));

        let device = vs.device();
        Self { vs, policy, value, device }
    }

    /// Forward pass: action logits `[batch, num_actions]` and state values
    /// `[batch]`
    pub fn forward(&self, obs: &Tensor) -> (Tensor, Tensor) {
        let logits = self.policy.forward(obs);
        let values = self.value.forward(obs).squeeze_dim(-1);
        (logits, values)
    }

    /// Sample an action per row
    ///
    /// Returns `(actions, log_probs, entropy, values)`: sampled action
    /// indices `[batch]`, the log-probability of each sample `[batch]`, the
    /// mean entropy of the batch's distributions (scalar), and the state
    /// values `[batch]`. Log-probs, entropy and values carry gradient.
    pub fn get_action(&self, obs: &Tensor) -> (Tensor, Tensor, Tensor, Tensor) {
        let (logits, values) = self.forward(obs);

        let log_probs_all = logits.log_softmax(-1, Kind::Float);
        let probs = logits.softmax(-1, Kind::Float);
        let actions = probs.multinomial(1, true).squeeze_dim(-1);

        let log_probs =
            log_probs_all.gather(-1, &actions.unsqueeze(-1), false).squeeze_dim(-1);
        let entropy = -(&probs * &log_probs_all)
            .sum_dim_intlist(-1, false, Kind::Float)
            .mean(Kind::Float);

        (actions, log_probs, entropy, values)
    }

    /// Log-probabilities, entropy and values for given actions
    pub fn evaluate_actions(&self, obs: &Tensor, actions: &Tensor) -> (Tensor, Tensor, Tensor) {
        let (logits, values) = self.forward(obs);

        let log_probs_all = logits.log_softmax(-1, Kind::Float);
        let probs = log_probs_all.exp();

        let log_probs =
            log_probs_all.gather(-1, &actions.unsqueeze(-1), false).squeeze_dim(-1);
        let entropy = -(&probs * &log_probs_all)
            .sum_dim_intlist(-1, false, Kind::Float)
            .mean(Kind::Float);

        (log_probs, entropy, values)
    }

    /// Device the parameters live on
    pub fn device(&self) -> Device {
        self.device
    }

    /// Parameter store (for optimizer construction)
    pub fn var_store(&self) -> &nn::VarStore {
        &self.vs
    }

    /// Create an Adam optimizer over every parameter of both towers
    pub fn optimizer(&self, learning_rate: f64) -> Result<nn::Optimizer> {
        Ok(nn::Adam::default().build(&self.vs, learning_rate)?)
    }

    /// Save parameters to a file
    pub fn save<P: AsRef<std::path::Path>>(&self, path: P) -> Result<()> {
        self.vs.save(path)?;
        Ok(())
    }

    /// Load parameters from a file; fails fast on a shape mismatch
    pub fn load<P: AsRef<std::path::Path>>(&mut self, path: P) -> Result<()> {
        self.vs.load(path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forward_shapes() {
        let net = PolicyValueNet::new(4, 2);
        let obs = Tensor::randn([8, 4], (Kind::Float, net.device()));

        let (logits, values) = net.forward(&obs);
        assert_eq!(logits.size(), vec![8, 2]);
        assert_eq!(values.size(), vec![8]);
    }

    #[test]
    fn sampled_actions_are_in_range() {
        let net = PolicyValueNet::new(4, 2);
        let obs = Tensor::randn([16, 4], (Kind::Float, net.device()));

        let (actions, log_probs, entropy, values) = net.get_action(&obs);
        assert_eq!(actions.size(), vec![16]);
        assert_eq!(log_probs.size(), vec![16]);
        assert_eq!(entropy.size(), Vec::<i64>::new());
        assert_eq!(values.size(), vec![16]);

        let actions: Vec<i64> = Vec::try_from(actions).unwrap();
        for a in actions {
            assert!((0..2).contains(&a));
        }
    }

    #[test]
    fn sampling_is_reproducible_under_a_fixed_seed() {
        let net = PolicyValueNet::new(4, 2);
        let obs = Tensor::randn([8, 4], (Kind::Float, net.device()));

        tch::manual_seed(17);
        let (first, _, _, _) = net.get_action(&obs);
        tch::manual_seed(17);
        let (second, _, _, _) = net.get_action(&obs);

        let first: Vec<i64> = Vec::try_from(first).unwrap();
        let second: Vec<i64> = Vec::try_from(second).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn entropy_is_nonnegative() {
        let net = PolicyValueNet::new(4, 2);
        let obs = Tensor::randn([8, 4], (Kind::Float, net.device()));
        let actions = Tensor::randint(2, [8], (Kind::Int64, net.device()));

        let (_, entropy, _) = net.evaluate_actions(&obs, &actions);
        let entropy: f64 = entropy.try_into().unwrap();
        assert!(entropy >= 0.0);
    }

    #[test]
    fn save_load_round_trip() {
        let net = PolicyValueNet::new(4, 2);
        let path = std::env::temp_dir().join("advantage_rl_pvnet_roundtrip.pt");

        let obs = Tensor::randn([4, 4], (Kind::Float, net.device()));
        let (logits_before, values_before) = net.forward(&obs);

        net.save(&path).unwrap();
        let mut restored = PolicyValueNet::new(4, 2);
        restored.load(&path).unwrap();
        let (logits_after, values_after) = restored.forward(&obs);

        let logit_diff: f64 = (&logits_before - &logits_after).abs().max().try_into().unwrap();
        let value_diff: f64 = (&values_before - &values_after).abs().max().try_into().unwrap();
        assert!(logit_diff < 1e-6);
        assert!(value_diff < 1e-6);

        std::fs::remove_file(path).ok();
    }
}
