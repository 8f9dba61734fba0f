//! Separate actor and critic networks
//!
//! The two-optimizer agent updates actor and critic parameters through
//! independent Adam instances, so each tower owns its own `nn::VarStore`.
//! Both share the same trunk shape:
//!
//! ```text
//! Input (observations)
//!         |
//!     [Dense(300)] - ReLU
//!         |
//!     [Dense(150)] - ReLU
//!         |
//!     [Dense(75)]  - ReLU
//!         |
//!     [Dense(out)]
//! ```
//!
//! where `out` is the action count for the actor and 1 for the critic.
//! All linear layers use a variance-scaling orthogonal init (√2 gain for
//! the ReLU trunk, small gain on the output layer) and a 0.01 constant
//! bias.

use anyhow::Result;
use tch::{
    nn::{self, Init, Module},
    Device, Tensor,
};

const HIDDEN: [i64; 3] = [300, 150, 75];

fn trunk_config() -> nn::LinearConfig {
    nn::LinearConfig {
        ws_init: Init::Orthogonal { gain: 2.0_f64.sqrt() },
        bs_init: Some(Init::Const(0.01)),
        ..Default::default()
    }
}

fn head_config() -> nn::LinearConfig {
    nn::LinearConfig {
        ws_init: Init::Orthogonal { gain: 0.01 },
        bs_init: Some(Init::Const(0.01)),
        ..Default::default()
    }
}

fn build_trunk(root: &nn::Path, obs_dim: i64) -> nn::Sequential {
    let mut net = nn::seq();
    let mut in_dim = obs_dim;
    for (i, &width) in HIDDEN.iter().enumerate() {
        net = net
            .add(nn::linear(root / format!("fc{}", i + 1), in_dim, width, trunk_config()))
            .add_fn(|x| x.relu());
        in_dim = width;
    }
    net
}

/// Policy network producing action logits
pub struct ActorNet {
    vs: nn::VarStore,
    net: nn::Sequential,
    device: Device,
}

impl ActorNet {
    /// Build an actor for `obs_dim`-dimensional observations and
    /// `num_actions` discrete actions
    pub fn new(obs_dim: i64, num_actions: i64) -> Self {
        let vs = nn::VarStore::new(Device::cuda_if_available());
        let root = vs.root();
        let net = build_trunk(&root, obs_dim)
            .add(nn::linear(&root / "out", HIDDEN[2], num_actions, head_config()));
        let device = vs.device();
        Self { vs, net, device }
    }

    /// Forward pass: unnormalized action logits, shape `[batch, num_actions]`
    pub fn forward(&self, obs: &Tensor) -> Tensor {
        self.net.forward(obs)
    }

    /// Device the parameters live on
    pub fn device(&self) -> Device {
        self.device
    }

    /// Parameter store (for optimizer construction)
    pub fn var_store(&self) -> &nn::VarStore {
        &self.vs
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

/// Value network producing a scalar state-value estimate
pub struct CriticNet {
    vs: nn::VarStore,
    net: nn::Sequential,
    device: Device,
}

impl CriticNet {
    /// Build a critic for `obs_dim`-dimensional observations
    pub fn new(obs_dim: i64) -> Self {
        let vs = nn::VarStore::new(Device::cuda_if_available());
        let root = vs.root();
        let net =
            build_trunk(&root, obs_dim).add(nn::linear(&root / "out", HIDDEN[2], 1, head_config()));
        let device = vs.device();
        Self { vs, net, device }
    }

    /// Forward pass: state values, shape `[batch]`
    pub fn forward(&self, obs: &Tensor) -> Tensor {
        self.net.forward(obs).squeeze_dim(-1)
    }

    /// Device the parameters live on
    pub fn device(&self) -> Device {
        self.device
    }

    /// Parameter store (for optimizer construction)
    pub fn var_store(&self) -> &nn::VarStore {
        &self.vs
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
