//! Loss computation for Actor-Critic updates
//!
//! Pure tensor functions shared by both learner variants: the
//! temporal-difference target, the critic's regression loss, and the
//! policy-gradient actor loss.

use tch::{Kind, Tensor};

/// Temporal-difference bootstrap target
///
/// `target = reward + gamma * next_value * (1 - done)`
///
/// The `done` flag (0.0 or 1.0 per element) gates the bootstrap: terminal
/// transitions regress toward the bare reward. `next_value` is expected to
/// be detached; the target never carries gradient back into the critic.
pub fn td_target(reward: &Tensor, next_value: &Tensor, done: &Tensor, gamma: f64) -> Tensor {
    let nonterminal = done * -1.0 + 1.0;
    reward + next_value * nonterminal * gamma
}

/// Critic loss: mean squared TD error
pub fn critic_loss(value: &Tensor, target: &Tensor) -> Tensor {
    (target - value).square().mean(Kind::Float)
}

/// Actor loss: negative mean of `log π(a|s) * advantage`
///
/// The advantage must already be detached; this function does not sever the
/// graph itself, so passing an attached tensor would leak the policy
/// gradient into whatever produced the advantage.
pub fn actor_loss(log_prob: &Tensor, advantage: &Tensor) -> Tensor {
    -(log_prob * advantage).mean(Kind::Float)
}

/// Combined scalar loss for the single-optimizer learner
///
/// `policy + vf_coef * value - ent_coef * entropy`
pub fn combined_loss(
    policy_loss: &Tensor,
    value_loss: &Tensor,
    entropy: &Tensor,
    vf_coef: f64,
    ent_coef: f64,
) -> Tensor {
    policy_loss + value_loss * vf_coef - entropy * ent_coef
}
