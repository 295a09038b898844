use std::sync::{Arc, RwLock};

use anyhow::Result;

use tabular_q_learning::environment::maze_environment::{initial_q_table, MazeEnvironment, RoomIdEncoder};
use tabular_q_learning::ql::learn::tabular_q_learner::{Parameter, TabularQLearner};
use tabular_q_learning::util::init_logging;

fn main() -> Result<()> {
    init_logging();

    let environment = Arc::new(RwLock::new(MazeEnvironment::new()));
    let param = Parameter {
        gamma: 0.95,
        episodes: 300,
        ..Parameter::default()
    };
    let mut learner = TabularQLearner::with_q_table(Arc::clone(&environment), RoomIdEncoder, param, initial_q_table())?;

    let samples = learner.train()?.to_vec();

    println!("Actions to reach the goal per training episode: {:?}", samples);
    // replay of the last episode
    environment.read().unwrap().render();
    println!("Lowest number of actions to complete maze: {}", samples.last().unwrap());
    Ok(())
}
