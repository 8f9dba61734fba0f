//! Episode-reward accounting for vectorized rollouts
//!
//! The vectorized driver interleaves many episodes across its slots; this
//! tracker keeps one running reward sum per slot, banks the total whenever
//! that slot's episode finishes, and starts the next episode at zero.

/// Per-slot cumulative episode rewards
#[derive(Debug, Clone)]
pub struct EpisodeTracker {
    running: Vec<f32>,
    completed: Vec<f32>,
}

impl EpisodeTracker {
    /// Create a tracker for `num_slots` parallel environments
    pub fn new(num_slots: usize) -> Self {
        Self { running: vec![0.0; num_slots], completed: Vec::new() }
    }

    /// Record one batched step of rewards and done flags
    ///
    /// # Panics
    ///
    /// Panics if the slice lengths disagree with the slot count.
    pub fn record(&mut self, rewards: &[f32], dones: &[bool]) {
        assert_eq!(rewards.len(), self.running.len(), "reward count != slot count");
        assert_eq!(dones.len(), self.running.len(), "done count != slot count");

        for (slot, (&reward, &done)) in rewards.iter().zip(dones).enumerate() {
            self.running[slot] += reward;
            if done {
                self.completed.push(self.running[slot]);
                self.running[slot] = 0.0;
            }
        }
    }

    /// Totals of every finished episode, in completion order
    pub fn completed(&self) -> &[f32] {
        &self.completed
    }

    /// Number of finished episodes across all slots
    pub fn episodes(&self) -> usize {
        self.completed.len()
    }

    /// Total of the most recently finished episode
    pub fn last_completed(&self) -> Option<f32> {
        self.completed.last().copied()
    }

    /// Number of slots being tracked
    pub fn slots(&self) -> usize {
        self.running.len()
    }
}
