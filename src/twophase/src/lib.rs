#![warn(clippy::pedantic)]
#![allow(clippy::similar_names, clippy::too_many_lines)]

//! Kociemba's two-phase solver for the 3x3x3 Rubik's Cube.
//!
//! A cube is first brought into the subgroup `<U, D, R2, L2, F2, B2>` (phase
//! 1), where corner and edge orientation are solved and the four equator edges
//! sit in the equator. Phase 2 then solves the permutation using only moves
//! of that subgroup. Both phases are iterative deepening searches guided by
//! exact distance tables over small coordinate spaces.

pub mod canonical_fsm;
pub mod config;
pub mod coord;
pub mod cube;
pub mod facelet;
pub mod moves;
pub mod phase1;
pub mod phase2;
pub mod pruning;
pub(crate) mod search;
pub mod solver;
pub mod tables;

pub use config::SolverConfig;
pub use cube::{CubeError, CubieCube, MalformedCubeError, UnreachableStateError};
pub use moves::{Face, Move, MoveSequence};
pub use solver::{Solution, SolveError, Solver};

#[macro_export]
macro_rules! start {
    ($msg:expr) => {
        concat!("⏳ ", $msg)
    };
}

#[macro_export]
macro_rules! working {
    ($msg:expr) => {
        concat!("🛠  ", $msg)
    };
}

#[macro_export]
macro_rules! success {
    ($msg:expr) => {
        concat!("✅ ", $msg)
    };
}

/// `FACT[n] = n!`, enough for the 12 edges.
const FACT: [u32; 13] = {
    let mut arr = [0; 13];
    arr[0] = 1;
    let mut i = 1;
    while i < arr.len() {
        arr[i] = arr[i - 1] * i as u32;
        i += 1;
    }
    arr
};

/// `BINOMIAL[n][k] = n choose k`, zero when `k > n`.
const BINOMIAL: [[u32; 13]; 13] = {
    let mut arr = [[0; 13]; 13];
    let mut n = 0;
    while n < 13 {
        arr[n][0] = 1;
        let mut k = 1;
        while k <= n {
            arr[n][k] = arr[n - 1][k - 1] + if k < n { arr[n - 1][k] } else { 0 };
            k += 1;
        }
        n += 1;
    }
    arr
};
