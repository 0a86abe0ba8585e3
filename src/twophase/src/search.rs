//! The depth-limited search shared by both phases.

use std::ops::ControlFlow;

use crate::{
    canonical_fsm::{CANONICAL_FSM, CanonicalFSMState},
    moves::Move,
};

/// A coordinate space searched with iterative deepening.
pub(crate) trait SearchSpace {
    type Coord: Copy;

    /// The moves tried at each node, in order.
    fn moves(&self) -> &'static [Move];

    /// The coordinate after the move at position `move_index` of
    /// [`SearchSpace::moves`].
    fn apply(&self, coord: Self::Coord, move_index: usize) -> Self::Coord;

    /// A lower bound on the moves left, zero exactly at the goal.
    fn admissible_heuristic(&self, coord: Self::Coord) -> u8;

    /// Whether a solution may end with `move_`.
    fn permits_final_move(&self, _move: Move) -> bool {
        true
    }
}

/// State of one depth-limited pass.
pub(crate) struct DepthSearch<'a, S: SearchSpace> {
    space: &'a S,
    path: Vec<Move>,
    pub nodes_visited: u64,
}

impl<'a, S: SearchSpace> DepthSearch<'a, S> {
    pub fn new(space: &'a S) -> Self {
        Self {
            space,
            path: vec![],
            nodes_visited: 0,
        }
    }

    /// Call `visitor` with every canonical sequence of exactly `depth` moves
    /// from `root` to the goal, along with the canonical FSM state after it,
    /// until the visitor breaks.
    pub fn run<V>(
        &mut self,
        root: S::Coord,
        start_fsm: CanonicalFSMState,
        depth: u8,
        visitor: &mut V,
    ) -> ControlFlow<()>
    where
        V: FnMut(&[Move], CanonicalFSMState) -> ControlFlow<()>,
    {
        self.path.clear();
        self.path.reserve(depth as usize);
        if self.space.admissible_heuristic(root) > depth {
            return ControlFlow::Continue(());
        }
        self.search(root, start_fsm, depth, visitor)
    }

    fn search<V>(
        &mut self,
        coord: S::Coord,
        fsm_state: CanonicalFSMState,
        togo: u8,
        visitor: &mut V,
    ) -> ControlFlow<()>
    where
        V: FnMut(&[Move], CanonicalFSMState) -> ControlFlow<()>,
    {
        self.nodes_visited += 1;

        if togo == 0 {
            // Callers only descend into nodes whose heuristic fits in `togo`,
            // so this is exactly the goal test
            return if self.space.admissible_heuristic(coord) == 0 {
                visitor(&self.path, fsm_state)
            } else {
                ControlFlow::Continue(())
            };
        }

        for (move_index, &move_) in self.space.moves().iter().enumerate() {
            let Some(next_fsm_state) = CANONICAL_FSM.next_state(fsm_state, move_.face()) else {
                continue;
            };
            if togo == 1 && !self.space.permits_final_move(move_) {
                continue;
            }

            let next = self.space.apply(coord, move_index);
            if self.space.admissible_heuristic(next) > togo - 1 {
                continue;
            }

            self.path.push(move_);
            let flow = self.search(next, next_fsm_state, togo - 1, visitor);
            self.path.pop();
            flow?;
        }

        ControlFlow::Continue(())
    }
}
