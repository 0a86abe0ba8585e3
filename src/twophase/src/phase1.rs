//! Phase 1: reach the subgroup `<U, D, R2, L2, F2, B2>`, where twist, flip,
//! and slice are all zero.

use std::{ops::ControlFlow, time::Instant};

use log::{debug, trace};

use crate::{
    canonical_fsm::CanonicalFSMState,
    coord::Phase1Coord,
    moves::Move,
    search::{DepthSearch, SearchSpace},
    tables::Tables,
    working,
};

pub struct Phase1<'a> {
    tables: &'a Tables,
}

impl SearchSpace for Phase1<'_> {
    type Coord = Phase1Coord;

    fn moves(&self) -> &'static [Move] {
        &Move::ALL
    }

    #[inline]
    fn apply(&self, coord: Phase1Coord, move_index: usize) -> Phase1Coord {
        self.tables
            .moves
            .apply_phase1(coord, Move::ALL[move_index])
    }

    #[inline]
    fn admissible_heuristic(&self, coord: Phase1Coord) -> u8 {
        self.tables.phase1_heuristic(coord)
    }

    /// A sequence ending in a phase 2 move already reached the subgroup one
    /// move earlier.
    fn permits_final_move(&self, move_: Move) -> bool {
        !move_.is_phase2()
    }
}

impl<'a> Phase1<'a> {
    #[must_use]
    pub fn new(tables: &'a Tables) -> Self {
        Self { tables }
    }

    /// Lower bound on the length of any phase 1 solution from `coord`.
    #[must_use]
    pub fn lower_bound(&self, coord: Phase1Coord) -> u8 {
        self.admissible_heuristic(coord)
    }

    /// A shortest phase 1 solution of at most `max_depth` moves.
    #[must_use]
    pub fn solve(&self, coord: Phase1Coord, max_depth: u8) -> Option<Vec<Move>> {
        for depth in self.lower_bound(coord)..=max_depth {
            let mut solution = None;
            let flow = self.for_each_solution(coord, depth, |moves, _| {
                solution = Some(moves.to_vec());
                ControlFlow::Break(())
            });
            if flow.is_break() {
                return solution;
            }
        }
        None
    }

    /// Call `visitor` with every canonical phase 1 solution of exactly `depth`
    /// moves, and the canonical FSM state it ends in, until the visitor
    /// breaks.
    pub fn for_each_solution<V>(
        &self,
        coord: Phase1Coord,
        depth: u8,
        mut visitor: V,
    ) -> ControlFlow<()>
    where
        V: FnMut(&[Move], CanonicalFSMState) -> ControlFlow<()>,
    {
        trace!(working!("Searching phase 1 depth {}..."), depth);
        let now = Instant::now();

        let mut search = DepthSearch::new(self);
        let flow = search.run(coord, CanonicalFSMState::default(), depth, &mut visitor);

        debug!(
            working!("Phase 1 depth {}: traversed {} nodes in {:.3}s"),
            depth,
            search.nodes_visited,
            now.elapsed().as_secs_f64()
        );
        flow
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        cube::CubieCube,
        moves::{MoveSequence, apply_moves},
        tables,
    };

    #[test]
    fn solved_needs_no_moves() {
        let phase1 = Phase1::new(tables::global());
        assert_eq!(phase1.solve(Phase1Coord::default(), 12), Some(vec![]));
    }

    #[test]
    fn phase2_states_need_no_moves() {
        let phase1 = Phase1::new(tables::global());
        let cube = apply_moves(&CubieCube::SOLVED, "U R2 F2 D' L2");
        assert_eq!(phase1.solve(Phase1Coord::from_cube(&cube), 12), Some(vec![]));
    }

    #[test]
    fn single_move() {
        let phase1 = Phase1::new(tables::global());
        let cube = apply_moves(&CubieCube::SOLVED, "F");
        let solution = phase1.solve(Phase1Coord::from_cube(&cube), 12).unwrap();
        assert_eq!(solution.len(), 1);
        assert!(cube.apply_sequence(&solution).in_phase2_subgroup());
    }

    #[test]
    fn solutions_reach_the_subgroup() {
        let phase1 = Phase1::new(tables::global());
        for _ in 0..10 {
            let cube = CubieCube::SOLVED.apply_sequence(MoveSequence::random(30).moves());
            let solution = phase1.solve(Phase1Coord::from_cube(&cube), 12).unwrap();
            assert!(solution.len() <= 12);
            assert!(cube.apply_sequence(&solution).in_phase2_subgroup());
            if let Some(last) = solution.last() {
                assert!(!last.is_phase2());
            }
        }
    }

    #[test]
    fn first_solution_is_shortest() {
        let phase1 = Phase1::new(tables::global());
        let cube = apply_moves(&CubieCube::SOLVED, "R U F L' B D2");
        let coord = Phase1Coord::from_cube(&cube);
        let solution = phase1.solve(coord, 12).unwrap();
        assert!(cube.apply_sequence(&solution).in_phase2_subgroup());
        for depth in 0..solution.len() as u8 {
            assert!(
                phase1
                    .for_each_solution(coord, depth, |_, _| ControlFlow::Break(()))
                    .is_continue(),
                "found a solution of {depth} moves"
            );
        }
        let shorter = solution.len() as u8 - 1;
        assert_eq!(phase1.solve(coord, shorter), None);
    }

    #[test]
    fn enumerates_distinct_solutions() {
        let phase1 = Phase1::new(tables::global());
        let cube = apply_moves(&CubieCube::SOLVED, "R U F L' B D2");
        let coord = Phase1Coord::from_cube(&cube);
        let depth = phase1.solve(coord, 12).unwrap().len() as u8;

        let mut found = vec![];
        let _ = phase1.for_each_solution(coord, depth, |moves, _| {
            found.push(moves.to_vec());
            ControlFlow::Continue(())
        });
        assert!(!found.is_empty());
        for solution in &found {
            assert_eq!(solution.len(), depth as usize);
            assert!(cube.apply_sequence(solution).in_phase2_subgroup());
        }
        let count = found.len();
        found.sort();
        found.dedup();
        assert_eq!(found.len(), count);
    }
}
