use std::sync::{Arc, RwLock};

use anyhow::Result;
use itertools::Itertools;
use num_format::ToFormattedString;
use rand::prelude::ThreadRng;
use rand::Rng;
use rustc_hash::FxHashMap;

use crate::ql::prelude::{Action, Environment, QlError, StateEncoder};
use crate::ql::q_table::QTable;
use crate::ql::schedule::DecayingRate;
use crate::util::number_format;

pub struct Parameter {
    /// Discount rate; (0 <= 𝛾 <= 1) represents the value of future rewards. The bigger, the more farsighted the agent becomes
    pub gamma: f32,
    /// Number of episodes to train
    pub episodes: usize,
    /// Floor of the decaying learning rate schedule
    pub min_learning_rate: f64,
    /// Floor of the decaying exploration rate schedule
    pub min_exploration_rate: f64,
    // Safety cap for a single episode - not expected to trigger with the shipped environments
    pub max_steps_per_episode: usize,
    pub progress_report_after_episodes: usize,
}

impl Default for Parameter {
    fn default() -> Self {
        Self {
            gamma: 0.99,
            episodes: 150,
            min_learning_rate: 0.001,
            min_exploration_rate: 0.01,
            max_steps_per_episode: 10_000,
            progress_report_after_episodes: 50,
        }
    }
}

/// A self-driving tabular Q-learning algorithm.
///
/// Directly connected to an [Environment], it drives a fixed number of
/// episodes and maintains a dense [QTable] of action-value estimates via the
/// one-step Q-learning backup:
///
/// `q[s, a] ← (1 - α) * q[s, a] + α * (reward + 𝛾 * max_a' q[s', a'])`
///
/// Both α (learning rate) and ε (exploration rate) decay per episode on a
/// [DecayingRate] schedule. The per-episode step counts are collected as the
/// primary observable output.
pub struct TabularQLearner<E, C>
where
    E: Environment,
    C: StateEncoder<E::S>,
{
    environment: Arc<RwLock<E>>,
    encoder: C,
    param: Parameter,
    rng: ThreadRng,
    q_table: QTable,
    learning_rate: DecayingRate,
    exploration_rate: DecayingRate,
    episode_steps: Vec<usize>,
    action_counts: FxHashMap<E::A, usize>,
    step_count: usize,
    episode_count: usize,
}

impl<E, C> TabularQLearner<E, C>
where
    E: Environment,
    C: StateEncoder<E::S>,
{
    /// Learner starting from an all-zero Q-table sized from the encoder's state space
    pub fn new(
        environment: Arc<RwLock<E>>,
        encoder: C,
        param: Parameter,
    ) -> Self {
        let q_table = QTable::zeros(encoder.state_space(), E::A::ACTION_SPACE as usize);
        Self::init(environment, encoder, param, q_table)
    }

    /// Learner starting from a hand-authored Q-table (e.g. a reward table)
    pub fn with_q_table(
        environment: Arc<RwLock<E>>,
        encoder: C,
        param: Parameter,
        q_table: QTable,
    ) -> Result<Self> {
        if q_table.n_states() != encoder.state_space() || q_table.n_actions() != E::A::ACTION_SPACE as usize {
            return Err(QlError(format!(
                "Q-table dimensions ({}x{}) do not match state space {} / action space {}",
                q_table.n_states(),
                q_table.n_actions(),
                encoder.state_space(),
                E::A::ACTION_SPACE
            ))
            .into());
        }
        Ok(Self::init(environment, encoder, param, q_table))
    }

    fn init(
        environment: Arc<RwLock<E>>,
        encoder: C,
        param: Parameter,
        q_table: QTable,
    ) -> Self {
        let learning_rate = DecayingRate::new(param.min_learning_rate);
        let exploration_rate = DecayingRate::new(param.min_exploration_rate);
        Self {
            environment,
            encoder,
            param,
            rng: rand::thread_rng(),
            q_table,
            learning_rate,
            exploration_rate,
            episode_steps: Vec::new(),
            action_counts: FxHashMap::default(),
            step_count: 0,
            episode_count: 0,
        }
    }

    /// Runs the configured number of episodes and returns the ordered
    /// per-episode step counts (frames survived / actions taken).
    pub fn train(&mut self) -> Result<&[usize]> {
        for episode in 0..self.param.episodes {
            if episode + 1 == self.param.episodes {
                // capture the final episode for replay / rendering
                self.environment.write().unwrap().set_recording(true);
            }

            let steps = self.learn_episode(episode)?;
            self.episode_steps.push(steps);

            if (episode + 1) % self.param.progress_report_after_episodes == 0 {
                self.progress_log();
            }
        }
        Ok(&self.episode_steps)
    }

    /// Runs one episode: reset → (act → step → encode → update)* → terminal.
    /// Returns the number of steps taken.
    pub fn learn_episode(
        &mut self,
        episode: usize,
    ) -> Result<usize> {
        self.environment.write().unwrap().reset();
        let mut state = {
            let initial = self.environment.read().unwrap().state_as_rc();
            self.encoder.encode(&initial)
        };

        let learning_rate = self.learning_rate.at(episode) as f32;
        let exploration_rate = self.exploration_rate.at(episode);
        log::trace!("started learning episode {} (α={:.3}, ε={:.3})", episode, learning_rate, exploration_rate);

        let mut steps = 0;
        for _ in 0..self.param.max_steps_per_episode {
            self.step_count += 1;

            // Use epsilon-greedy for exploration
            let action = select_action::<E::A>(&self.q_table, state, exploration_rate, &mut self.rng)?;
            self.action_counts.entry(action).and_modify(|e| *e += 1).or_insert(1);

            // Apply the sampled action in our environment
            let (next_observation, reward, done) = self.environment.write().unwrap().step_as_rc(action);
            let next_state = self.encoder.encode(&next_observation);
            log::trace!("step with action {} resulted in reward: {:.2}, done: {}", action, reward, done);

            // Q value = reward + discount factor * expected future reward
            let learned_value = updated_q_value(&self.q_table, reward, next_state, self.param.gamma);
            let old_value = self.q_table.get(state, action.numeric());
            self.q_table
                .set(state, action.numeric(), (1.0 - learning_rate) * old_value + learning_rate * learned_value);

            state = next_state;
            steps += 1;

            if done {
                break;
            }
        }

        self.episode_count += 1;
        Ok(steps)
    }

    pub fn q_table(&self) -> &QTable { &self.q_table }

    pub fn episode_steps(&self) -> &[usize] { &self.episode_steps }

    fn progress_log(&self) {
        let number_format = number_format();
        let total_actions: usize = self.action_counts.values().sum();
        let action_distribution_line = self
            .action_counts
            .iter()
            .sorted_by_key(|(action, _)| action.numeric())
            .map(|(action, &count)| {
                let ratio = 100.0 * count as f32 / total_actions as f32;
                format!("{} {:.1}%", action, ratio)
            })
            .join(", ");

        log::info!(
            "finished training episode: {}, steps: {}, 𝛾={:.2}, action_distribution: {}",
            self.episode_count.to_formatted_string(&number_format),
            self.step_count.to_formatted_string(&number_format),
            self.param.gamma,
            action_distribution_line
        );
    }
}

/// One-step Q-learning target: immediate reward plus discounted best next-state value
fn updated_q_value(
    q_table: &QTable,
    reward: f32,
    next_state: usize,
    gamma: f32,
) -> f32 {
    reward + gamma * q_table.max_future_value(next_state)
}

/// Epsilon-greedy selection over one Q-table row: with probability
/// `exploration_rate` a uniformly random action, otherwise the stable argmax
fn select_action<A: Action>(
    q_table: &QTable,
    state: usize,
    exploration_rate: f64,
    rng: &mut ThreadRng,
) -> Result<A> {
    let numeric = if rng.gen_range(0.0_f64..1.0) < exploration_rate {
        rng.gen_range(0..A::ACTION_SPACE)
    } else {
        q_table.best_action(state)
    };
    A::try_from_numeric(numeric)
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use crate::environment::maze_environment::{initial_q_table, MazeAction, MazeEnvironment, GOAL_ROOM};
    use crate::environment::maze_environment::RoomIdEncoder;

    use super::*;

    #[test]
    fn test_updated_q_value_on_terminal_reward() {
        // all next-state values 0 → target is exactly the reward
        let q_table = QTable::zeros(6, 6);
        let target = updated_q_value(&q_table, 100.0, 3, 0.95);
        assert_eq!(target, 100.0);

        // with α = 1.0 the blended write equals the target
        let mut q_table = q_table;
        let alpha = 1.0_f32;
        let old_value = q_table.get(2, 3);
        q_table.set(2, 3, (1.0 - alpha) * old_value + alpha * target);
        assert_eq!(q_table.get(2, 3), 100.0);
    }

    #[test]
    fn test_updated_q_value_discounts_future() {
        let mut q_table = QTable::zeros(2, 2);
        q_table.set(1, 0, 10.0);
        let target = updated_q_value(&q_table, 1.0, 1, 0.95);
        assert!((target - 10.5).abs() < 1e-6);
    }

    #[test]
    fn test_select_action_greedy_tie_break() {
        // all entries equal → index 0 wins, regardless of how often we draw
        let q_table = QTable::zeros(6, 6);
        let mut rng = rand::thread_rng();
        for _ in 0..100 {
            let action: MazeAction = select_action(&q_table, 2, 0.0, &mut rng).unwrap();
            assert_eq!(action.numeric(), 0);
        }
    }

    #[rstest]
    #[case([-1.0, -1.0, -1.0, 0.0, -1.0, -1.0], 3)]
    #[case([0.0, -1.0, -1.0, 0.0, -1.0, 100.0], 5)]
    #[case([5.0, 4.0, 3.0, 2.0, 1.0, 0.0], 0)]
    fn test_select_action_greedy_is_argmax(
        #[case] row: [f32; 6],
        #[case] expected: u8,
    ) {
        let q_table = QTable::from_rows([row]);
        let mut rng = rand::thread_rng();
        for _ in 0..20 {
            let action: MazeAction = select_action(&q_table, 0, 0.0, &mut rng).unwrap();
            assert_eq!(action.numeric(), expected);
        }
    }

    #[test]
    fn test_learn_single_maze_episode() -> Result<()> {
        let environment = Arc::new(RwLock::new(MazeEnvironment::new()));
        let mut learner =
            TabularQLearner::with_q_table(Arc::clone(&environment), RoomIdEncoder, Parameter::default(), initial_q_table())?;

        let steps = learner.learn_episode(0)?;

        assert!(steps >= 1);
        assert_eq!(learner.episode_count, 1);
        assert_eq!(*environment.read().unwrap().state(), GOAL_ROOM);
        Ok(())
    }

    #[test]
    fn test_with_q_table_rejects_wrong_dimensions() {
        let environment = Arc::new(RwLock::new(MazeEnvironment::new()));
        let result = TabularQLearner::with_q_table(environment, RoomIdEncoder, Parameter::default(), QTable::zeros(4, 6));
        assert!(result.is_err());
    }
}
