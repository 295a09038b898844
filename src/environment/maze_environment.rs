use std::fmt::{Display, Formatter};

use anyhow::Result;
use itertools::Itertools;

use crate::ql::prelude::{Action, Environment, QlError, StateEncoder, TableActionType};
use crate::ql::q_table::QTable;

pub const START_ROOM: u8 = 2;
pub const GOAL_ROOM: u8 = 5;

/// Doors per room: `ADJACENT_ROOMS[room]` lists the rooms reachable from `room`
const ADJACENT_ROOMS: [&[u8]; 6] = [
    &[4],
    &[3, 5],
    &[3],
    &[1, 2, 4],
    &[0, 3, 5],
    &[1, 4],
];

/// An escape-room maze of six rooms connected by doors per [ADJACENT_ROOMS].
///
/// The agent starts in room 2 and tries to reach room 5. An action names the
/// room to move to. Moving through a door earns +1; walking against a wall
/// leaves the state unchanged and earns -1 (a penalty, not an error). The
/// episode ends when room 5 is reached.
pub struct MazeEnvironment {
    room: u8,
    recording: bool,
    recorded_actions: Vec<MazeAction>,
}

impl MazeEnvironment {
    pub fn new() -> Self {
        Self {
            room: START_ROOM,
            recording: false,
            recorded_actions: Vec::new(),
        }
    }

    pub fn is_door(
        from: u8,
        to: u8,
    ) -> bool {
        ADJACENT_ROOMS[from as usize].contains(&to)
    }

    /// Actions of the last recorded episode (legal moves only)
    pub fn recorded_actions(&self) -> &[MazeAction] { &self.recorded_actions }

    /// Prints the recorded action sequence of the last episode
    pub fn render(&self) {
        println!("Actions to take: [{}]", self.recorded_actions.iter().join(", "));
    }
}

impl Default for MazeEnvironment {
    fn default() -> Self { Self::new() }
}

impl Environment for MazeEnvironment {
    type S = u8;
    type A = MazeAction;

    fn reset(&mut self) {
        self.room = START_ROOM;
        self.recorded_actions.clear();
    }

    fn state(&self) -> &Self::S { &self.room }

    fn step(
        &mut self,
        action: Self::A,
    ) -> (&Self::S, f32, bool) {
        let reward = if Self::is_door(self.room, action.target_room()) {
            self.room = action.target_room();
            if self.recording {
                self.recorded_actions.push(action);
            }
            1.0
        } else {
            -1.0
        };

        let done = self.room == GOAL_ROOM;
        (&self.room, reward, done)
    }

    fn set_recording(
        &mut self,
        enabled: bool,
    ) {
        self.recording = enabled
    }
}

/// Move to the room carrying this number
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub struct MazeAction(u8);

impl MazeAction {
    pub fn target_room(&self) -> u8 { self.0 }
}

impl Display for MazeAction {
    fn fmt(
        &self,
        f: &mut Formatter<'_>,
    ) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Action for MazeAction {
    const ACTION_SPACE: TableActionType = 6;

    fn numeric(&self) -> TableActionType { self.0 }

    fn try_from_numeric(value: TableActionType) -> Result<Self> {
        if value < Self::ACTION_SPACE {
            Ok(MazeAction(value))
        } else {
            Err(QlError(format!("value {} out of range", value)).into())
        }
    }
}

/// The room id IS the Q-table row
pub struct RoomIdEncoder;

impl StateEncoder<u8> for RoomIdEncoder {
    fn state_space(&self) -> usize { 6 }

    fn encode(
        &self,
        state: &u8,
    ) -> usize {
        *state as usize
    }
}

/// Hand-authored starting table: -1 marks invalid transitions,
/// 100 marks the goal-reaching transitions
#[rustfmt::skip]
pub fn initial_q_table() -> QTable {
    QTable::from_rows([
        [-1.0, -1.0, -1.0, -1.0,  0.0,  -1.0],
        [-1.0, -1.0, -1.0,  0.0, -1.0, 100.0],
        [-1.0, -1.0, -1.0,  0.0, -1.0,  -1.0],
        [-1.0,  0.0,  0.0, -1.0,  0.0,  -1.0],
        [ 0.0, -1.0, -1.0,  0.0, -1.0, 100.0],
        [-1.0,  0.0, -1.0, -1.0,  0.0, 100.0],
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_legal_move_from_start_room() {
        let mut env = MazeEnvironment::new();
        assert_eq!(*env.state(), 2);

        let (state, reward, done) = env.step(MazeAction(3));
        assert_eq!(*state, 3);
        assert_eq!(reward, 1.0);
        assert_eq!(done, false);
    }

    #[test]
    fn test_illegal_move_keeps_state() {
        let mut env = MazeEnvironment::new();

        let (state, reward, done) = env.step(MazeAction(0));
        assert_eq!(*state, 2);
        assert_eq!(reward, -1.0);
        assert_eq!(done, false);
    }

    #[test]
    fn test_reaching_the_goal_room_ends_the_episode() {
        let mut env = MazeEnvironment::new();
        for action in [MazeAction(3), MazeAction(1)] {
            let (_, _, done) = env.step(action);
            assert_eq!(done, false);
        }

        let (state, reward, done) = env.step(MazeAction(5));
        assert_eq!(*state, GOAL_ROOM);
        assert_eq!(reward, 1.0);
        assert_eq!(done, true);
    }

    #[test]
    fn test_recording_captures_legal_moves_only() {
        let mut env = MazeEnvironment::new();
        env.set_recording(true);
        env.reset();

        env.step(MazeAction(0)); // wall
        env.step(MazeAction(3));
        env.step(MazeAction(5)); // wall
        env.step(MazeAction(1));
        env.step(MazeAction(5));

        assert_eq!(env.recorded_actions(), &[MazeAction(3), MazeAction(1), MazeAction(5)]);
    }

    #[test]
    fn test_reset_returns_to_start_room() {
        let mut env = MazeEnvironment::new();
        env.step(MazeAction(3));
        env.reset();
        assert_eq!(*env.state(), START_ROOM);
        assert!(env.recorded_actions().is_empty());
    }

    #[test]
    fn test_initial_q_table_matches_adjacency() {
        let table = initial_q_table();
        for from in 0..6_u8 {
            for to in 0..6_u8 {
                let value = table.get(from as usize, to);
                if MazeEnvironment::is_door(from, to) {
                    assert!(value >= 0.0, "door {}→{} must not be marked invalid", from, to);
                    assert_eq!(value == 100.0, to == GOAL_ROOM);
                } else if (from, to) == (GOAL_ROOM, GOAL_ROOM) {
                    // staying in the goal room is authored as goal-reaching, not as a wall
                    assert_eq!(value, 100.0);
                } else {
                    assert_eq!(value, -1.0, "wall {}→{} must be marked invalid", from, to);
                }
            }
        }
    }

    #[test]
    fn test_action_numeric_round_trip() {
        for numeric in 0..6 {
            let action = MazeAction::try_from_numeric(numeric).unwrap();
            assert_eq!(action.numeric(), numeric);
        }
        assert!(MazeAction::try_from_numeric(6).is_err());
    }
}
