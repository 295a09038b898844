use std::sync::{Arc, RwLock};

use anyhow::Result;

use tabular_q_learning::environment::cart_pole_environment::{CartPoleEnvironment, PoleStateEncoder, MAX_EPISODE_STEPS};
use tabular_q_learning::ql::learn::tabular_q_learner::{Parameter, TabularQLearner};
use tabular_q_learning::ql::q_table::QTable;
use tabular_q_learning::util::init_logging;

#[test]
fn test_learn_cartpole_full_training_run() -> Result<()> {
    init_logging();

    let environment = Arc::new(RwLock::new(CartPoleEnvironment::new()));
    let param = Parameter {
        gamma: 0.99,
        episodes: 150,
        ..Parameter::default()
    };
    let mut learner = TabularQLearner::new(Arc::clone(&environment), PoleStateEncoder::new(), param);

    let samples = learner.train()?.to_vec();
    assert_eq!(samples.len(), 150);
    assert!(samples.iter().all(|&steps| (1..=MAX_EPISODE_STEPS).contains(&steps)));

    // training must have touched the table
    assert_ne!(*learner.q_table(), QTable::zeros(72, 2));

    // the recorded final episode matches its reported step count
    let final_episode = environment.read().unwrap().recorded_actions().len();
    assert_eq!(final_episode, *samples.last().unwrap());
    Ok(())
}
