//! Move-to-beacon mini-game
//!
//! A self-contained stand-in for the strategy-game mini-game the sequential
//! agent trains on: a single unit on a 64×64 screen must walk onto a beacon.
//! The 16 discrete actions name the centers of a 4×4 grid of move targets;
//! each step the unit advances a fixed stride toward its current target.
//!
//! The reward is the shaped signal the original training script engineered
//! by hand: the per-step reduction in distance to the beacon, with a +100
//! bonus on capture. Capturing respawns the beacon elsewhere and the episode
//! keeps running until the step limit.

use anyhow::Result;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::env::{Environment, SpaceInfo, SpaceType, StepInfo, StepResult};

/// Screen side length in pixels
pub const SCREEN_SIZE: f32 = 64.0;

/// Number of discrete move-target actions (a 4×4 grid)
pub const NUM_ACTIONS: usize = 16;

const GRID_SIDE: i64 = 4;
const CELL: f32 = SCREEN_SIZE / GRID_SIDE as f32;
const STRIDE: f32 = 8.0;
const CAPTURE_RADIUS: f32 = 3.0;
const CAPTURE_REWARD: f32 = 100.0;
const MAX_STEPS: usize = 240;

/// Decode a discrete action index into screen coordinates
///
/// Action `i` maps to the center of cell `(i % 4, i / 4)` of a 4×4 grid laid
/// over the screen. This is the action-translation step between the agent's
/// categorical output and the game's native point order.
///
/// # Panics
///
/// Panics if `action` is outside `[0, NUM_ACTIONS)`.
pub fn action_to_screen(action: i64) -> (f32, f32) {
    assert!(
        (0..NUM_ACTIONS as i64).contains(&action),
        "action {} outside the {}-cell grid",
        action,
        NUM_ACTIONS
    );
    let col = action % GRID_SIDE;
    let row = action / GRID_SIDE;
    (col as f32 * CELL + CELL / 2.0, row as f32 * CELL + CELL / 2.0)
}

/// Move-to-beacon environment
#[derive(Debug)]
pub struct BeaconEnv {
    unit: (f32, f32),
    beacon: (f32, f32),
    prev_distance: f32,
    steps: usize,
    rng: SmallRng,
}

impl BeaconEnv {
    /// Create a new environment with a randomly seeded RNG
    pub fn new() -> Self {
        Self::from_rng(SmallRng::from_entropy())
    }

    /// Create a new environment with a fixed RNG seed
    pub fn with_seed(seed: u64) -> Self {
        Self::from_rng(SmallRng::seed_from_u64(seed))
    }

    fn from_rng(rng: SmallRng) -> Self {
        Self { unit: (0.0, 0.0), beacon: (0.0, 0.0), prev_distance: 0.0, steps: 0, rng }
    }

    fn random_point(&mut self) -> (f32, f32) {
        (self.rng.gen_range(2.0..SCREEN_SIZE - 2.0), self.rng.gen_range(2.0..SCREEN_SIZE - 2.0))
    }

    fn distance(&self) -> f32 {
        let dx = self.unit.0 - self.beacon.0;
        let dy = self.unit.1 - self.beacon.1;
        (dx * dx + dy * dy).sqrt()
    }

    /// Advance the unit one stride toward the given target point
    fn advance_toward(&mut self, target: (f32, f32)) {
        let dx = target.0 - self.unit.0;
        let dy = target.1 - self.unit.1;
        let len = (dx * dx + dy * dy).sqrt();
        if len <= STRIDE {
            self.unit = target;
        } else {
            self.unit.0 += dx / len * STRIDE;
            self.unit.1 += dy / len * STRIDE;
        }
    }

    /// Normalized `[unit_x, unit_y, beacon_x, beacon_y]`
    fn observation(&self) -> Vec<f32> {
        vec![
            self.unit.0 / SCREEN_SIZE,
            self.unit.1 / SCREEN_SIZE,
            self.beacon.0 / SCREEN_SIZE,
            self.beacon.1 / SCREEN_SIZE,
        ]
    }
}

impl Default for BeaconEnv {
    fn default() -> Self {
        Self::new()
    }
}

impl Environment for BeaconEnv {
    type Observation = Vec<f32>;
    type Action = i64;

    fn reset(&mut self) -> Result<Self::Observation> {
        self.unit = self.random_point();
        self.beacon = self.random_point();
        self.prev_distance = self.distance();
        self.steps = 0;
        Ok(self.observation())
    }

    fn step(&mut self, action: Self::Action) -> Result<StepResult<Self::Observation>> {
        let target = action_to_screen(action);
        self.advance_toward(target);
        self.steps += 1;

        let distance = self.distance();
        let mut reward = self.prev_distance - distance;

        if distance < CAPTURE_RADIUS {
            reward = CAPTURE_REWARD;
            self.beacon = self.random_point();
        }
        self.prev_distance = self.distance();

        Ok(StepResult {
            observation: self.observation(),
            reward,
            terminated: false,
            truncated: self.steps >= MAX_STEPS,
            info: StepInfo::default(),
        })
    }

    fn observation_space(&self) -> SpaceInfo {
        SpaceInfo { shape: vec![4], dtype: SpaceType::Continuous }
    }

    fn action_space(&self) -> SpaceInfo {
        SpaceInfo { shape: vec![], dtype: SpaceType::Discrete(NUM_ACTIONS) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_decode_covers_the_grid() {
        let (x0, y0) = action_to_screen(0);
        assert_eq!((x0, y0), (8.0, 8.0));

        let (x15, y15) = action_to_screen(15);
        assert_eq!((x15, y15), (56.0, 56.0));

        for a in 0..NUM_ACTIONS as i64 {
            let (x, y) = action_to_screen(a);
            assert!(x > 0.0 && x < SCREEN_SIZE);
            assert!(y > 0.0 && y < SCREEN_SIZE);
        }
    }

    #[test]
    #[should_panic(expected = "outside")]
    fn action_decode_rejects_out_of_range() {
        action_to_screen(16);
    }

    #[test]
    fn observation_is_normalized() {
        let mut env = BeaconEnv::with_seed(1);
        let obs = env.reset().unwrap();

        assert_eq!(obs.len(), 4);
        for &v in &obs {
            assert!((0.0..=1.0).contains(&v));
        }
    }

    #[test]
    fn closing_on_the_beacon_pays_positive_reward() {
        let mut env = BeaconEnv::with_seed(5);
        env.reset().unwrap();

        // Pin the positions: walking from (40, 40) toward the move target
        // at (8, 8) must close the gap to a beacon at (10, 10).
        env.unit = (40.0, 40.0);
        env.beacon = (10.0, 10.0);
        env.prev_distance = env.distance();

        let result = env.step(0).unwrap();
        assert!(result.reward > 0.0, "moving toward the beacon should pay, got {}", result.reward);
    }

    #[test]
    fn moving_away_from_the_beacon_costs() {
        let mut env = BeaconEnv::with_seed(5);
        env.reset().unwrap();

        env.unit = (20.0, 20.0);
        env.beacon = (10.0, 10.0);
        env.prev_distance = env.distance();

        // Action 15 targets (56, 56), directly away from the beacon.
        let result = env.step(15).unwrap();
        assert!(result.reward < 0.0, "retreating should cost, got {}", result.reward);
    }

    #[test]
    fn capture_pays_bonus_and_respawns_beacon() {
        let mut env = BeaconEnv::with_seed(9);
        env.reset().unwrap();

        // Beacon sits on the action-0 move target; a unit one stride out
        // walks exactly onto it.
        env.beacon = (8.0, 8.0);
        env.unit = (12.0, 8.0);
        env.prev_distance = env.distance();
        let old_beacon = env.beacon;

        let result = env.step(0).unwrap();

        assert_eq!(result.reward, CAPTURE_REWARD);
        assert_ne!(env.beacon, old_beacon, "beacon should respawn after capture");
        assert!(!result.terminated);
    }

    #[test]
    fn truncates_at_step_limit() {
        let mut env = BeaconEnv::with_seed(2);
        env.reset().unwrap();
        env.steps = MAX_STEPS - 1;

        assert!(env.step(0).unwrap().truncated);
    }

    #[test]
    fn spaces_match_the_contract() {
        let env = BeaconEnv::new();
        assert_eq!(env.observation_space().shape, vec![4]);
        assert!(matches!(env.action_space().dtype, SpaceType::Discrete(NUM_ACTIONS)));
    }
}
