use std::{
    fmt,
    ops::ControlFlow,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Instant,
};

use itertools::Itertools;
use log::{debug, info};
use thiserror::Error;

use crate::{
    config::{DEFAULT_MAX_LENGTH, DEFAULT_PHASE1_MAX_DEPTH, DEFAULT_PHASE2_MAX_DEPTH, SolverConfig},
    coord::{Phase1Coord, Phase2Coord},
    cube::{CubeError, CubieCube},
    moves::{Move, MoveSequence},
    phase1::Phase1,
    phase2::Phase2,
    start, success,
    tables::{self, Tables},
    working,
};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SolveError {
    #[error(transparent)]
    Cube(#[from] CubeError),
    #[error("No solution of at most {max_length} moves was found")]
    NoSolutionFound { max_length: usize },
    #[error("The solve was cancelled")]
    Cancelled,
}

/// Where a solve is. Transitions are logged at debug level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolverState {
    Initial,
    Phase1Searching,
    Phase1Found,
    Phase2Searching,
    Solved,
    Failed,
}

/// A solution: a phase 1 sequence into `<U, D, R2, L2, F2, B2>` followed by
/// a phase 2 sequence inside it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Solution {
    pub phase1: Vec<Move>,
    pub phase2: Vec<Move>,
}

impl Solution {
    #[must_use]
    pub fn moves(&self) -> Vec<Move> {
        self.phase1.iter().chain(&self.phase2).copied().collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.phase1.len() + self.phase2.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<Solution> for MoveSequence {
    fn from(solution: Solution) -> Self {
        MoveSequence::new(solution.moves())
    }
}

impl fmt::Display for Solution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.phase1.iter().chain(&self.phase2).format(" "))
    }
}

/// Two-phase solver over the process-wide tables.
#[derive(Clone)]
pub struct Solver {
    tables: &'static Tables,
    max_length: usize,
    phase1_max_depth: usize,
    phase2_max_depth: usize,
    cancellation: Option<Arc<AtomicBool>>,
}

impl fmt::Debug for Solver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Solver")
            .field("max_length", &self.max_length)
            .field("phase1_max_depth", &self.phase1_max_depth)
            .field("phase2_max_depth", &self.phase2_max_depth)
            .finish_non_exhaustive()
    }
}

impl Default for Solver {
    fn default() -> Self {
        Self::new()
    }
}

impl Solver {
    /// A solver with default limits. Builds the tables if nothing has yet.
    #[must_use]
    pub fn new() -> Self {
        Self::with_tables(tables::global())
    }

    #[must_use]
    pub fn with_tables(tables: &'static Tables) -> Self {
        Self {
            tables,
            max_length: DEFAULT_MAX_LENGTH,
            phase1_max_depth: DEFAULT_PHASE1_MAX_DEPTH,
            phase2_max_depth: DEFAULT_PHASE2_MAX_DEPTH,
            cancellation: None,
        }
    }

    /// A solver with the limits of `config`, initializing the tables with its
    /// table settings if nothing has yet.
    #[must_use]
    pub fn from_config(config: &SolverConfig) -> Self {
        Self::with_tables(tables::init(&config.into()))
            .with_max_length(config.max_length)
            .with_phase1_max_depth(config.phase1_max_depth)
            .with_phase2_max_depth(config.phase2_max_depth)
    }

    /// Ceiling on the combined solution length.
    #[must_use]
    pub fn with_max_length(mut self, max_length: usize) -> Self {
        self.max_length = max_length;
        self
    }

    #[must_use]
    pub fn with_phase1_max_depth(mut self, phase1_max_depth: usize) -> Self {
        self.phase1_max_depth = phase1_max_depth;
        self
    }

    #[must_use]
    pub fn with_phase2_max_depth(mut self, phase2_max_depth: usize) -> Self {
        self.phase2_max_depth = phase2_max_depth;
        self
    }

    /// Stop solving with [`SolveError::Cancelled`] once `flag` is set.
    #[must_use]
    pub fn with_cancellation(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancellation = Some(flag);
        self
    }

    #[must_use]
    pub fn max_length(&self) -> usize {
        self.max_length
    }

    fn cancelled(&self) -> bool {
        self.cancellation
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }

    /// Solve the cube reached by applying `scramble` to a solved cube.
    ///
    /// # Errors
    ///
    /// See [`Solver::solve`]; also fails if a move token is invalid.
    pub fn solve_scramble(&self, scramble: &str) -> Result<Solution, SolveError> {
        let cube = CubieCube::from_scramble(scramble).map_err(CubeError::from)?;
        self.solve(&cube)
    }

    /// Solve a cube given as a facelet string.
    ///
    /// # Errors
    ///
    /// See [`Solver::solve`]; also fails if the facelets don't describe a
    /// reachable cube.
    pub fn solve_facelets(&self, facelets: &str) -> Result<Solution, SolveError> {
        self.solve(&CubieCube::from_facelets(facelets)?)
    }

    /// Find a solution of at most `max_length` moves, trying phase 1
    /// solutions in order of increasing length and completing each with the
    /// shortest phase 2 solution that fits.
    ///
    /// # Errors
    ///
    /// `NoSolutionFound` when no solution fits the limits, `Cancelled` when
    /// the cancellation flag was raised, and `Cube` for an invalid cube.
    pub fn solve(&self, cube: &CubieCube) -> Result<Solution, SolveError> {
        cube.verify()?;

        let mut state = SolverState::Initial;
        if cube.is_solved() {
            transition(&mut state, SolverState::Solved);
            return Ok(Solution::default());
        }

        info!(start!("Solving {}"), cube);
        let now = Instant::now();

        let phase1 = Phase1::new(self.tables);
        let phase2 = Phase2::new(self.tables);
        let root = Phase1Coord::from_cube(cube);
        let max_phase1 = self
            .phase1_max_depth
            .min(self.max_length)
            .min(usize::from(u8::MAX));

        transition(&mut state, SolverState::Phase1Searching);

        let mut solution = None;
        let mut cancelled = false;
        for depth in usize::from(phase1.lower_bound(root))..=max_phase1 {
            if self.cancelled() {
                cancelled = true;
                break;
            }
            debug!(working!("Searching phase 1 depth {}..."), depth);

            // Search depths are bytes; anything past 255 is unbounded in practice
            let phase2_ceiling = u8::try_from(self.phase2_max_depth.min(self.max_length - depth))
                .unwrap_or(u8::MAX);
            let phase1_depth = u8::try_from(depth).unwrap_or(u8::MAX);
            let flow = phase1.for_each_solution(root, phase1_depth, |phase1_moves, fsm_state| {
                if self.cancelled() {
                    cancelled = true;
                    return ControlFlow::Break(());
                }
                transition(&mut state, SolverState::Phase1Found);

                let intermediate = cube.apply_sequence(phase1_moves);
                let coord = Phase2Coord::from_cube(&intermediate);

                transition(&mut state, SolverState::Phase2Searching);
                match phase2.solve(coord, fsm_state, phase2_ceiling) {
                    Some(phase2_moves) => {
                        solution = Some(Solution {
                            phase1: phase1_moves.to_vec(),
                            phase2: phase2_moves,
                        });
                        ControlFlow::Break(())
                    }
                    None => {
                        transition(&mut state, SolverState::Phase1Searching);
                        ControlFlow::Continue(())
                    }
                }
            });
            if flow.is_break() {
                break;
            }
        }

        match solution {
            Some(solution) => {
                transition(&mut state, SolverState::Solved);
                info!(
                    success!("Found a {} move solution in {:.3}s"),
                    solution.len(),
                    now.elapsed().as_secs_f64()
                );
                Ok(solution)
            }
            None => {
                transition(&mut state, SolverState::Failed);
                if cancelled {
                    Err(SolveError::Cancelled)
                } else {
                    Err(SolveError::NoSolutionFound {
                        max_length: self.max_length,
                    })
                }
            }
        }
    }
}

fn transition(state: &mut SolverState, next: SolverState) {
    debug!("{state:?} -> {next:?}");
    *state = next;
}
