use std::f64::consts::PI;
use std::fmt::{Display, Formatter};

use anyhow::Result;
use rand::Rng;

use crate::ql::discretizer::{UniformBins, UniformGridDiscretizer};
use crate::ql::prelude::{Action, Environment, QlError, StateEncoder, TableActionType};

const GRAVITY: f64 = 9.8;
const CART_MASS: f64 = 1.0;
const POLE_MASS: f64 = 0.1;
const TOTAL_MASS: f64 = CART_MASS + POLE_MASS;
/// Half the pole length - the dynamics act on the pole's center of mass
const POLE_HALF_LENGTH: f64 = 0.5;
const POLE_MASS_LENGTH: f64 = POLE_MASS * POLE_HALF_LENGTH;
const FORCE_MAG: f64 = 10.0;
/// Seconds between state updates (Euler integration step)
const TAU: f64 = 0.02;

/// Episode ends when the pole leans more than 12° off vertical
pub const POLE_ANGLE_LIMIT: f64 = 12.0 * PI / 180.0;
const CART_POSITION_LIMIT: f64 = 2.4;
pub const MAX_EPISODE_STEPS: usize = 200;

/// Pole angles observable before the episode is over reach up to twice the
/// termination limit - that range is what the binning covers
pub const POLE_ANGLE_BOUND: f64 = 2.0 * POLE_ANGLE_LIMIT;
pub const POLE_VELOCITY_BOUND: f64 = 50.0 * PI / 180.0;

pub const POLE_ANGLE_BINS: usize = 6;
pub const POLE_VELOCITY_BINS: usize = 12;

/// The classic cart-pole balancing task (Barto, Sutton & Anderson).
///
/// A pole is hinged on a cart moving along a frictionless track. Each step
/// pushes the cart left or right with a fixed force; the episode ends when the
/// pole leans more than 12° off vertical, the cart leaves the track section,
/// or 200 steps have elapsed. Reward is 1.0 per step survived, including the
/// terminal one.
pub struct CartPoleEnvironment {
    state: CartPoleState,
    elapsed_steps: usize,
    recording: bool,
    recorded_actions: Vec<CartPoleAction>,
}

impl CartPoleEnvironment {
    pub fn new() -> Self {
        Self {
            state: CartPoleState::random_initial_state(),
            elapsed_steps: 0,
            recording: false,
            recorded_actions: Vec::new(),
        }
    }

    /// Actions of the last recorded episode
    pub fn recorded_actions(&self) -> &[CartPoleAction] { &self.recorded_actions }
}

impl Default for CartPoleEnvironment {
    fn default() -> Self { Self::new() }
}

impl Environment for CartPoleEnvironment {
    type S = CartPoleState;
    type A = CartPoleAction;

    fn reset(&mut self) {
        self.state = CartPoleState::random_initial_state();
        self.elapsed_steps = 0;
        self.recorded_actions.clear();
    }

    fn state(&self) -> &Self::S { &self.state }

    fn step(
        &mut self,
        action: Self::A,
    ) -> (&Self::S, f32, bool) {
        self.state.integrate(action);
        self.elapsed_steps += 1;
        if self.recording {
            self.recorded_actions.push(action);
        }

        let done = self.state.out_of_balance() || self.elapsed_steps >= MAX_EPISODE_STEPS;
        (&self.state, 1.0, done)
    }

    fn set_recording(
        &mut self,
        enabled: bool,
    ) {
        self.recording = enabled
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct CartPoleState {
    pub cart_position: f64,
    pub cart_velocity: f64,
    pub pole_angle: f64,
    pub pole_velocity: f64,
}

impl CartPoleState {
    fn random_initial_state() -> Self {
        let mut rng = rand::thread_rng();
        Self {
            cart_position: rng.gen_range(-0.05..0.05),
            cart_velocity: rng.gen_range(-0.05..0.05),
            pole_angle: rng.gen_range(-0.05..0.05),
            pole_velocity: rng.gen_range(-0.05..0.05),
        }
    }

    /// One Euler step of the cart-pole dynamics under the given push
    fn integrate(
        &mut self,
        action: CartPoleAction,
    ) {
        let force = match action {
            CartPoleAction::PushLeft => -FORCE_MAG,
            CartPoleAction::PushRight => FORCE_MAG,
        };
        let cos_theta = self.pole_angle.cos();
        let sin_theta = self.pole_angle.sin();

        let temp = (force + POLE_MASS_LENGTH * self.pole_velocity * self.pole_velocity * sin_theta) / TOTAL_MASS;
        let pole_acceleration = (GRAVITY * sin_theta - cos_theta * temp)
            / (POLE_HALF_LENGTH * (4.0 / 3.0 - POLE_MASS * cos_theta * cos_theta / TOTAL_MASS));
        let cart_acceleration = temp - POLE_MASS_LENGTH * pole_acceleration * cos_theta / TOTAL_MASS;

        self.cart_position += TAU * self.cart_velocity;
        self.cart_velocity += TAU * cart_acceleration;
        self.pole_angle += TAU * self.pole_velocity;
        self.pole_velocity += TAU * pole_acceleration;
    }

    fn out_of_balance(&self) -> bool {
        self.cart_position.abs() > CART_POSITION_LIMIT || self.pole_angle.abs() > POLE_ANGLE_LIMIT
    }
}

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub enum CartPoleAction {
    PushLeft,
    PushRight,
}

impl Display for CartPoleAction {
    fn fmt(
        &self,
        f: &mut Formatter<'_>,
    ) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl Action for CartPoleAction {
    const ACTION_SPACE: TableActionType = 2;

    fn numeric(&self) -> TableActionType {
        use CartPoleAction::*;
        match self {
            PushLeft => 0,
            PushRight => 1,
        }
    }

    fn try_from_numeric(value: TableActionType) -> Result<Self> {
        use CartPoleAction::*;
        match value {
            0 => Ok(PushLeft),
            1 => Ok(PushRight),
            _ => Err(QlError(format!("value {} out of range", value)).into()),
        }
    }
}

/// Bins pole angle and pole angular velocity onto a 6x12 grid.
/// Cart position and velocity are deliberately ignored - for keeping the pole
/// upright only the pole's motion matters.
pub struct PoleStateEncoder {
    grid: UniformGridDiscretizer,
}

impl PoleStateEncoder {
    pub fn new() -> Self {
        Self {
            grid: UniformGridDiscretizer::new(vec![
                UniformBins::new(-POLE_ANGLE_BOUND, POLE_ANGLE_BOUND, POLE_ANGLE_BINS),
                UniformBins::new(-POLE_VELOCITY_BOUND, POLE_VELOCITY_BOUND, POLE_VELOCITY_BINS),
            ]),
        }
    }
}

impl Default for PoleStateEncoder {
    fn default() -> Self { Self::new() }
}

impl StateEncoder<CartPoleState> for PoleStateEncoder {
    fn state_space(&self) -> usize { self.grid.state_space() }

    fn encode(
        &self,
        state: &CartPoleState,
    ) -> usize {
        self.grid.flat_index(&[state.pole_angle, state.pole_velocity])
    }
}
