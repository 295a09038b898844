use std::sync::{Arc, RwLock};

use anyhow::Result;

use tabular_q_learning::environment::cart_pole_environment::{CartPoleEnvironment, PoleStateEncoder};
use tabular_q_learning::ql::learn::tabular_q_learner::{Parameter, TabularQLearner};
use tabular_q_learning::util::init_logging;

fn main() -> Result<()> {
    init_logging();

    let environment = Arc::new(RwLock::new(CartPoleEnvironment::new()));
    let param = Parameter {
        gamma: 0.99,
        episodes: 150,
        ..Parameter::default()
    };
    let mut learner = TabularQLearner::new(Arc::clone(&environment), PoleStateEncoder::new(), param);

    let samples = learner.train()?.to_vec();

    println!("Frames alive per training episode: {:?}", samples);
    let final_episode = environment.read().unwrap().recorded_actions().len();
    println!("Final episode survived {} frames", final_episode);
    Ok(())
}
