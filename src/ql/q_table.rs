use crate::ql::prelude::TableActionType;

/// Dense action-value table.
///
/// One row per discrete state, one column per action. Dimensions are fixed at
/// construction. Every entry stays finite at all times - the table starts from
/// finite values and the learner only writes convex blends of finite values.
#[derive(Clone, Debug, PartialEq)]
pub struct QTable {
    n_states: usize,
    n_actions: usize,
    values: Vec<f32>,
}

impl QTable {
    pub fn zeros(
        n_states: usize,
        n_actions: usize,
    ) -> Self {
        assert!(n_states > 0 && n_actions > 0);
        Self {
            n_states,
            n_actions,
            values: vec![0.0; n_states * n_actions],
        }
    }

    /// Table from hand-authored rows (e.g. a reward table serving as starting point)
    pub fn from_rows<const S: usize, const A: usize>(rows: [[f32; A]; S]) -> Self {
        Self {
            n_states: S,
            n_actions: A,
            values: rows.into_iter().flatten().collect(),
        }
    }

    pub fn n_states(&self) -> usize { self.n_states }

    pub fn n_actions(&self) -> usize { self.n_actions }

    pub fn get(
        &self,
        state: usize,
        action: TableActionType,
    ) -> f32 {
        self.row(state)[action as usize]
    }

    pub fn set(
        &mut self,
        state: usize,
        action: TableActionType,
        value: f32,
    ) {
        debug_assert!(value.is_finite());
        let offset = self.row_offset(state);
        self.values[offset + action as usize] = value;
    }

    /// Best reachable value from `state`: `max_a table[state, a]`
    pub fn max_future_value(
        &self,
        state: usize,
    ) -> f32 {
        self.row(state).iter().copied().fold(f32::NEG_INFINITY, f32::max)
    }

    /// Action index with the highest value in the row of `state`.
    /// Ties are broken by the lowest action index (stable argmax).
    pub fn best_action(
        &self,
        state: usize,
    ) -> TableActionType {
        let row = self.row(state);
        let mut best = 0_usize;
        for (i, &value) in row.iter().enumerate() {
            if value > row[best] {
                best = i;
            }
        }
        best as TableActionType
    }

    fn row(
        &self,
        state: usize,
    ) -> &[f32] {
        let offset = self.row_offset(state);
        &self.values[offset..offset + self.n_actions]
    }

    fn row_offset(
        &self,
        state: usize,
    ) -> usize {
        assert!(state < self.n_states, "state {} out of range (0..{})", state, self.n_states);
        state * self.n_actions
    }
}
