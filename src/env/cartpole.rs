//! CartPole-v0 environment
//!
//! Classic control benchmark: a pole hinged on a cart that slides along a
//! frictionless track. The agent pushes the cart left or right and earns
//! +1 for every step the pole stays upright.
//!
//! State is `[x, x_dot, theta, theta_dot]`; the episode terminates once the
//! cart leaves ±2.4 or the pole tips past ±12°, and truncates at 200 steps
//! (the v0 limit). Dynamics follow the Gym implementation: explicit Euler
//! integration at 0.02 s with a 10 N force.

use anyhow::Result;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::env::{Environment, SpaceInfo, SpaceType, StepInfo, StepResult};

const GRAVITY: f32 = 9.8;
const MASS_CART: f32 = 1.0;
const MASS_POLE: f32 = 0.1;
const TOTAL_MASS: f32 = MASS_CART + MASS_POLE;
const POLE_HALF_LENGTH: f32 = 0.5;
const POLE_MASS_LENGTH: f32 = MASS_POLE * POLE_HALF_LENGTH;
const FORCE_MAG: f32 = 10.0;
const TAU: f32 = 0.02;
const X_THRESHOLD: f32 = 2.4;
const THETA_THRESHOLD: f32 = 12.0 * 2.0 * std::f32::consts::PI / 360.0;
const MAX_STEPS: usize = 200;

/// CartPole-v0 environment
///
/// Each instance owns its RNG, so a fixed seed gives a reproducible episode
/// sequence regardless of what other environments or threads are doing.
#[derive(Debug)]
pub struct CartPole {
    x: f32,
    x_dot: f32,
    theta: f32,
    theta_dot: f32,

    steps: usize,
    rng: SmallRng,
}

impl CartPole {
    /// Create a new environment with a randomly seeded RNG
    pub fn new() -> Self {
        Self::from_rng(SmallRng::from_entropy())
    }

    /// Create a new environment with a fixed RNG seed
    pub fn with_seed(seed: u64) -> Self {
        Self::from_rng(SmallRng::seed_from_u64(seed))
    }

    fn from_rng(rng: SmallRng) -> Self {
        Self { x: 0.0, x_dot: 0.0, theta: 0.0, theta_dot: 0.0, steps: 0, rng }
    }

    /// Draw a fresh initial state, uniform in [-0.05, 0.05] per component
    fn reset_state(&mut self) {
        self.x = self.rng.gen_range(-0.05..0.05);
        self.x_dot = self.rng.gen_range(-0.05..0.05);
        self.theta = self.rng.gen_range(-0.05..0.05);
        self.theta_dot = self.rng.gen_range(-0.05..0.05);
    }

    /// One Euler integration step of the cart-pole dynamics
    fn physics_step(&mut self, action: i64) {
        let force = if action == 1 { FORCE_MAG } else { -FORCE_MAG };

        let cos_theta = self.theta.cos();
        let sin_theta = self.theta.sin();

        let temp =
            (force + POLE_MASS_LENGTH * self.theta_dot * self.theta_dot * sin_theta) / TOTAL_MASS;
        let theta_acc = (GRAVITY * sin_theta - cos_theta * temp)
            / (POLE_HALF_LENGTH * (4.0 / 3.0 - MASS_POLE * cos_theta * cos_theta / TOTAL_MASS));
        let x_acc = temp - POLE_MASS_LENGTH * theta_acc * cos_theta / TOTAL_MASS;

        self.x += TAU * self.x_dot;
        self.x_dot += TAU * x_acc;
        self.theta += TAU * self.theta_dot;
        self.theta_dot += TAU * theta_acc;
    }

    fn is_terminated(&self) -> bool {
        self.x < -X_THRESHOLD
            || self.x > X_THRESHOLD
            || self.theta < -THETA_THRESHOLD
            || self.theta > THETA_THRESHOLD
    }

    fn observation(&self) -> Vec<f32> {
        vec![self.x, self.x_dot, self.theta, self.theta_dot]
    }
}

impl Default for CartPole {
    fn default() -> Self {
        Self::new()
    }
}

impl Environment for CartPole {
    type Observation = Vec<f32>;
    type Action = i64;

    fn reset(&mut self) -> Result<Self::Observation> {
        self.reset_state();
        self.steps = 0;
        Ok(self.observation())
    }

    fn step(&mut self, action: Self::Action) -> Result<StepResult<Self::Observation>> {
        self.physics_step(action);
        self.steps += 1;

        let terminated = self.is_terminated();
        let truncated = self.steps >= MAX_STEPS;

        // Gym v0 pays the reward on every step, the terminating one included.
        Ok(StepResult {
            observation: self.observation(),
            reward: 1.0,
            terminated,
            truncated,
            info: StepInfo::default(),
        })
    }

    fn observation_space(&self) -> SpaceInfo {
        SpaceInfo { shape: vec![4], dtype: SpaceType::Continuous }
    }

    fn action_space(&self) -> SpaceInfo {
        SpaceInfo { shape: vec![], dtype: SpaceType::Discrete(2) }
    }
}
