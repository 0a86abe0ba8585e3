//! Phase 2: solve a cube of `<U, D, R2, L2, F2, B2>` using only those moves.

use std::{ops::ControlFlow, time::Instant};

use log::debug;

use crate::{
    canonical_fsm::CanonicalFSMState,
    coord::Phase2Coord,
    moves::Move,
    search::{DepthSearch, SearchSpace},
    tables::Tables,
    working,
};

pub struct Phase2<'a> {
    tables: &'a Tables,
}

impl SearchSpace for Phase2<'_> {
    type Coord = Phase2Coord;

    fn moves(&self) -> &'static [Move] {
        &Move::PHASE2
    }

    #[inline]
    fn apply(&self, coord: Phase2Coord, move_index: usize) -> Phase2Coord {
        self.tables.moves.apply_phase2(coord, move_index)
    }

    #[inline]
    fn admissible_heuristic(&self, coord: Phase2Coord) -> u8 {
        self.tables.phase2_heuristic(coord)
    }
}

impl<'a> Phase2<'a> {
    #[must_use]
    pub fn new(tables: &'a Tables) -> Self {
        Self { tables }
    }

    #[must_use]
    pub fn lower_bound(&self, coord: Phase2Coord) -> u8 {
        self.admissible_heuristic(coord)
    }

    /// A shortest phase 2 solution of at most `max_depth` moves that
    /// continues canonically from `start_fsm`, the state a phase 1 solution
    /// ended in.
    #[must_use]
    pub fn solve(
        &self,
        coord: Phase2Coord,
        start_fsm: CanonicalFSMState,
        max_depth: u8,
    ) -> Option<Vec<Move>> {
        let now = Instant::now();
        let mut search = DepthSearch::new(self);
        let mut solution = None;

        for depth in self.lower_bound(coord)..=max_depth {
            let flow = search.run(coord, start_fsm, depth, &mut |moves, _| {
                solution = Some(moves.to_vec());
                ControlFlow::Break(())
            });
            if flow.is_break() {
                break;
            }
        }

        debug!(
            working!("Phase 2 {} within {} moves: traversed {} nodes in {:.3}s"),
            if solution.is_some() { "solved" } else { "failed" },
            max_depth,
            search.nodes_visited,
            now.elapsed().as_secs_f64()
        );
        solution
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        canonical_fsm::CANONICAL_FSM,
        cube::CubieCube,
        moves::{Face, apply_moves},
        tables,
    };

    fn random_phase2_cube(len: usize) -> CubieCube {
        let moves = (0..len)
            .map(|_| Move::PHASE2[fastrand::usize(..Move::PHASE2.len())])
            .collect::<Vec<_>>();
        CubieCube::SOLVED.apply_sequence(&moves)
    }

    #[test]
    fn solved_needs_no_moves() {
        let phase2 = Phase2::new(tables::global());
        assert_eq!(
            phase2.solve(Phase2Coord::default(), CanonicalFSMState::default(), 18),
            Some(vec![])
        );
    }

    #[test]
    fn solves_short_sequences() {
        let phase2 = Phase2::new(tables::global());
        let cube = apply_moves(&CubieCube::SOLVED, "U R2 D' F2");
        let solution = phase2
            .solve(Phase2Coord::from_cube(&cube), CanonicalFSMState::default(), 18)
            .unwrap();
        assert!(solution.len() <= 4);
        assert!(cube.apply_sequence(&solution).is_solved());
        assert!(solution.iter().all(|m| m.is_phase2()));
    }

    #[test]
    fn solves_random_phase2_cubes() {
        let phase2 = Phase2::new(tables::global());
        for _ in 0..5 {
            let cube = random_phase2_cube(12);
            let solution = phase2
                .solve(Phase2Coord::from_cube(&cube), CanonicalFSMState::default(), 18)
                .unwrap();
            assert!(cube.apply_sequence(&solution).is_solved());
        }
    }

    #[test]
    fn respects_depth_ceiling() {
        let phase2 = Phase2::new(tables::global());
        let cube = apply_moves(&CubieCube::SOLVED, "U R2 D' F2 L2 B2");
        let coord = Phase2Coord::from_cube(&cube);
        let bound = phase2.lower_bound(coord);
        assert!(bound > 0);
        assert_eq!(
            phase2.solve(coord, CanonicalFSMState::default(), bound - 1),
            None
        );
    }

    #[test]
    fn continues_canonically_from_phase1() {
        let phase2 = Phase2::new(tables::global());
        let after_l = CANONICAL_FSM
            .next_state(CanonicalFSMState::default(), Face::L)
            .unwrap();
        let cube = apply_moves(&CubieCube::SOLVED, "R2 U");
        let solution = phase2
            .solve(Phase2Coord::from_cube(&cube), after_l, 18)
            .unwrap();
        assert_eq!(solution.len(), 2);
        assert!(cube.apply_sequence(&solution).is_solved());

        let mut state = after_l;
        for move_ in &solution {
            state = CANONICAL_FSM.next_state(state, move_.face()).unwrap();
        }
    }
}
