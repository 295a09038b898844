use std::fmt::{Display, Formatter};
use std::hash::Hash;
use std::rc::Rc;

use anyhow::Result;

/// Data type we use to encode an `Action` as a Q-table column index.
/// This one should fit for all usage szenarios (for now).
pub type TableActionType = u8;

pub trait Action: Display + Sized + Clone + Copy + Hash + PartialEq + Eq {
    /// Number of possible actions
    const ACTION_SPACE: TableActionType;
    /// Identifying the Action as a unique value in range (0..Self::action_space)
    fn numeric(&self) -> TableActionType;
    fn try_from_numeric(value: TableActionType) -> Result<Self>;
}

/// Learning environment, modeling the world of a learning agent
pub trait Environment {
    /// State representation - covering all needs
    type S: Clone;
    type A: Action;

    /// Resets the environment to a defined starting point
    fn reset(&mut self);

    /// Current state
    fn state(&self) -> &Self::S;

    /// Convenience wrapper around [Self::state]
    fn state_as_rc(&self) -> Rc<Self::S> { Rc::new(self.state().clone()) }

    /// Performs one time/action-step.
    ///
    /// Applies the given `action` to the environment and returns:
    ///   - next state
    ///   - immediate reward earned during performing that step
    ///   - done flag (e.g. game ended)
    ///
    fn step(
        &mut self,
        action: Self::A,
    ) -> (&Self::S, f32, bool);

    /// Convenience wrapper around [Self::step] returning an [Rc] with a copy of the state.
    /// This should match the typical use-case.
    fn step_as_rc(
        &mut self,
        action: Self::A,
    ) -> (Rc<Self::S>, f32, bool) {
        let (state, reward, done) = self.step(action);
        (Rc::new(state.clone()), reward, done)
    }

    /// Enables / disables capture of the performed actions, so the final
    /// episode can be replayed or printed after training. No-op by default.
    fn set_recording(
        &mut self,
        _enabled: bool,
    ) {
    }
}

/// Maps an environment state onto a Q-table row index.
pub trait StateEncoder<S> {
    /// Number of distinct row indices [Self::encode] may produce
    fn state_space(&self) -> usize;

    fn encode(
        &self,
        state: &S,
    ) -> usize;
}

#[derive(Debug)]
pub struct QlError(pub String);

impl QlError {
    pub fn from(msg: &str) -> Self { QlError(msg.to_string()) }
}

impl Display for QlError {
    fn fmt(
        &self,
        f: &mut Formatter<'_>,
    ) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for QlError {}
