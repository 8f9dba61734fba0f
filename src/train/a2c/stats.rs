//! Training statistics for Actor-Critic updates

use std::ops::AddAssign;

use serde::Serialize;

/// Scalar diagnostics from one or more updates
#[derive(Debug, Clone, Default, Serialize)]
pub struct UpdateStats {
    /// Policy-gradient loss
    pub actor_loss: f64,

    /// Value-regression loss
    pub critic_loss: f64,

    /// Mean entropy of the action distribution
    pub entropy: f64,

    /// Combined scalar loss
    pub total_loss: f64,

    /// Number of gradient updates aggregated into this value
    pub num_updates: usize,
}

impl UpdateStats {
    /// Create zero-initialized statistics
    pub fn zeros() -> Self {
        Self::default()
    }

    /// Create statistics for a single update
    pub fn new(actor_loss: f64, critic_loss: f64, entropy: f64, total_loss: f64) -> Self {
        Self { actor_loss, critic_loss, entropy, total_loss, num_updates: 1 }
    }

    /// Accumulate another statistics instance into this one
    pub fn add(&mut self, other: &UpdateStats) {
        self.actor_loss += other.actor_loss;
        self.critic_loss += other.critic_loss;
        self.entropy += other.entropy;
        self.total_loss += other.total_loss;
        self.num_updates += other.num_updates;
    }

    /// Average over the accumulated updates
    pub fn average(&self) -> Self {
        let scale = self.num_updates as f64;
        if scale == 0.0 {
            return Self::zeros();
        }
        Self {
            actor_loss: self.actor_loss / scale,
            critic_loss: self.critic_loss / scale,
            entropy: self.entropy / scale,
            total_loss: self.total_loss / scale,
            num_updates: 1,
        }
    }
}

impl AddAssign<&UpdateStats> for UpdateStats {
    fn add_assign(&mut self, other: &UpdateStats) {
        self.add(other);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accumulate_and_average() {
        let mut sum = UpdateStats::zeros();
        sum += &UpdateStats::new(1.0, 2.0, 0.5, 3.0);
        sum += &UpdateStats::new(3.0, 4.0, 1.5, 7.0);

        assert_eq!(sum.num_updates, 2);

        let avg = sum.average();
        assert_eq!(avg.actor_loss, 2.0);
        assert_eq!(avg.critic_loss, 3.0);
        assert_eq!(avg.entropy, 1.0);
        assert_eq!(avg.total_loss, 5.0);
        assert_eq!(avg.num_updates, 1);
    }

    #[test]
    fn averaging_nothing_is_zero() {
        let avg = UpdateStats::zeros().average();
        assert_eq!(avg.total_loss, 0.0);
        assert_eq!(avg.num_updates, 0);
    }
}
