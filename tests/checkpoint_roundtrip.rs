//! Checkpoint round-trip behavior
//!
//! Saving a trained agent and loading it into a freshly constructed one of
//! the same architecture must reproduce its action choice exactly for the
//! same input and sampling seed. A file from a different architecture must
//! be rejected at load time.

use advantage_rl::policy::mlp::PolicyValueNet;
use advantage_rl::train::a2c::{A2cAgent, A2cConfig, MultiA2c, MultiA2cConfig};
use tch::{Kind, Tensor};

fn temp_prefix(name: &str) -> std::path::PathBuf {
    std::env::temp_dir().join(format!("advantage_rl_{}_{}", name, std::process::id()))
}

#[test]
fn sequential_agent_round_trips_bit_identically() {
    let config = A2cConfig::new().obs_dim(4).num_actions(16).seed(31);
    let mut agent = A2cAgent::new(config.clone()).unwrap();

    // A little training so the saved weights are not the fresh init.
    let state = [0.3_f32, -0.1, 0.2, 0.0];
    let next_state = [0.4_f32, 0.0, 0.1, -0.1];
    for _ in 0..20 {
        agent.learn(1.0, &state, &next_state, 5).unwrap();
    }

    let prefix = temp_prefix("seq_roundtrip");
    agent.save(&prefix).unwrap();

    let mut restored = A2cAgent::new(config).unwrap();
    restored.load(&prefix).unwrap();

    tch::manual_seed(77);
    let (action_a, probs_a) = agent.choose_action(&state).unwrap();
    tch::manual_seed(77);
    let (action_b, probs_b) = restored.choose_action(&state).unwrap();

    assert_eq!(action_a, action_b);
    assert_eq!(probs_a, probs_b, "restored probabilities must match bit for bit");

    std::fs::remove_file(format!("{}.actor.pt", prefix.display())).ok();
    std::fs::remove_file(format!("{}.critic.pt", prefix.display())).ok();
}

#[test]
fn mismatched_architecture_fails_at_load() {
    let agent = A2cAgent::new(A2cConfig::new().obs_dim(4).num_actions(16)).unwrap();
    let prefix = temp_prefix("seq_mismatch");
    agent.save(&prefix).unwrap();

    let mut wrong = A2cAgent::new(A2cConfig::new().obs_dim(4).num_actions(4)).unwrap();
    assert!(wrong.load(&prefix).is_err(), "loading into a different action count must fail");

    std::fs::remove_file(format!("{}.actor.pt", prefix.display())).ok();
    std::fs::remove_file(format!("{}.critic.pt", prefix.display())).ok();
}

#[test]
fn missing_checkpoint_fails_at_load() {
    let mut agent = A2cAgent::new(A2cConfig::new()).unwrap();
    assert!(agent.load(temp_prefix("does_not_exist")).is_err());
}

#[test]
fn batched_learner_round_trips_bit_identically() {
    let mut agent =
        MultiA2c::new(MultiA2cConfig::new().obs_dim(4).num_actions(2).seed(41)).unwrap();
    let path = temp_prefix("multi_roundtrip").with_extension("pt");
    agent.save(&path).unwrap();

    let mut restored =
        MultiA2c::new(MultiA2cConfig::new().obs_dim(4).num_actions(2).seed(99)).unwrap();
    restored.load(&path).unwrap();

    let states = Tensor::randn([8, 4], (Kind::Float, agent.device()));
    let actions = Tensor::from_slice(&[0_i64, 1, 0, 1, 0, 1, 0, 1]).to_device(agent.device());

    let (log_probs_a, _, values_a) = agent.evaluate_actions(&states, &actions);
    let (log_probs_b, _, values_b) = restored.evaluate_actions(&states, &actions);

    let log_prob_diff: f64 = (&log_probs_a - &log_probs_b).abs().max().try_into().unwrap();
    let value_diff: f64 = (&values_a - &values_b).abs().max().try_into().unwrap();
    assert_eq!(log_prob_diff, 0.0);
    assert_eq!(value_diff, 0.0);

    std::fs::remove_file(path).ok();
}

#[test]
fn policy_net_round_trip_preserves_sampling() {
    let net = PolicyValueNet::new(4, 2);
    let path = temp_prefix("pvnet_sampling").with_extension("pt");
    net.save(&path).unwrap();

    let mut restored = PolicyValueNet::new(4, 2);
    restored.load(&path).unwrap();

    let obs = Tensor::randn([8, 4], (Kind::Float, net.device()));

    tch::manual_seed(123);
    let (actions_a, _, _, _) = net.get_action(&obs);
    tch::manual_seed(123);
    let (actions_b, _, _, _) = restored.get_action(&obs);

    let actions_a: Vec<i64> = Vec::try_from(actions_a).unwrap();
    let actions_b: Vec<i64> = Vec::try_from(actions_b).unwrap();
    assert_eq!(actions_a, actions_b);

    std::fs::remove_file(path).ok();
}
