//! The cubie-level cube state.
//!
//! A [`CubieCube`] records, for each of the 8 corner slots and 12 edge slots,
//! which cubie occupies the slot and how it is twisted or flipped relative to
//! that slot. This is the "replaced-by" convention: `cp[URF] = UBR` means the
//! UBR corner sits in the URF slot.

use std::fmt;

use itertools::Itertools;
use thiserror::Error;

pub const CORNER_COUNT: usize = 8;
pub const EDGE_COUNT: usize = 12;

pub const CORNER_NAMES: [&str; CORNER_COUNT] =
    ["URF", "UFL", "ULB", "UBR", "DFR", "DLF", "DBL", "DRB"];
pub const EDGE_NAMES: [&str; EDGE_COUNT] = [
    "UR", "UF", "UL", "UB", "DR", "DF", "DL", "DB", "FR", "FL", "BL", "BR",
];

/// The first of the four equator ("slice") edges FR, FL, BL, BR.
pub const FIRST_SLICE_EDGE: u8 = 8;

#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct CubieCube {
    pub(crate) cp: [u8; CORNER_COUNT],
    pub(crate) co: [u8; CORNER_COUNT],
    pub(crate) ep: [u8; EDGE_COUNT],
    pub(crate) eo: [u8; EDGE_COUNT],
}

/// The input does not describe a cube at all.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MalformedCubeError {
    #[error("A facelet string must have 54 facelets, but got {0}")]
    WrongLength(usize),
    #[error("'{0}' is not a face letter, expected one of U, R, F, D, L, B")]
    UnknownColor(char),
    #[error("Every color must appear exactly 9 times, but '{color}' appears {count} times")]
    WrongColorCount { color: char, count: usize },
    #[error("The center of the {face} face must be '{face}', but got '{actual}'")]
    WrongCenter { face: char, actual: char },
    #[error("No {kind} has the colors {colors}")]
    UnknownCubie { kind: &'static str, colors: String },
    #[error("The {kind} {name} appears more than once")]
    DuplicateCubie { kind: &'static str, name: &'static str },
    #[error("The {kind} permutation {permutation:?} is not a permutation")]
    NotAPermutation {
        kind: &'static str,
        permutation: Vec<u8>,
    },
    #[error("Orientation {value} of {kind} slot {slot} is out of range")]
    OrientationOutOfRange {
        kind: &'static str,
        slot: usize,
        value: u8,
    },
    #[error("Invalid move token '{0}'")]
    InvalidMoveToken(String),
}

/// The input describes a cube, but one that cannot be reached from solved by
/// turning faces.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnreachableStateError {
    #[error("The corner twists do not sum to a multiple of 3 (one corner is twisted)")]
    CornerTwist,
    #[error("The edge flips do not sum to a multiple of 2 (one edge is flipped)")]
    EdgeFlip,
    #[error("The corner and edge permutations have different parities (two pieces are swapped)")]
    Parity,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CubeError {
    #[error(transparent)]
    Malformed(#[from] MalformedCubeError),
    #[error(transparent)]
    Unreachable(#[from] UnreachableStateError),
}

impl CubieCube {
    pub const SOLVED: Self = Self {
        cp: [0, 1, 2, 3, 4, 5, 6, 7],
        co: [0; CORNER_COUNT],
        ep: [0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11],
        eo: [0; EDGE_COUNT],
    };

    #[must_use]
    pub fn solved() -> Self {
        Self::SOLVED
    }

    /// Build a cube from raw permutation and orientation arrays, checking
    /// that they describe a reachable state.
    ///
    /// # Errors
    ///
    /// `MalformedCubeError` if an array is not a permutation or an
    /// orientation is out of range, `UnreachableStateError` if the cube
    /// violates the twist, flip, or parity invariants.
    pub fn try_from_parts(
        cp: [u8; CORNER_COUNT],
        co: [u8; CORNER_COUNT],
        ep: [u8; EDGE_COUNT],
        eo: [u8; EDGE_COUNT],
    ) -> Result<Self, CubeError> {
        let cube = Self { cp, co, ep, eo };
        cube.verify()?;
        Ok(cube)
    }

    /// Check every invariant of a reachable cube.
    ///
    /// # Errors
    ///
    /// See [`CubieCube::try_from_parts`].
    pub fn verify(&self) -> Result<(), CubeError> {
        check_permutation("corner", &self.cp)?;
        check_permutation("edge", &self.ep)?;
        check_orientations("corner", &self.co, 3)?;
        check_orientations("edge", &self.eo, 2)?;

        if self.co.iter().map(|&o| u32::from(o)).sum::<u32>() % 3 != 0 {
            return Err(UnreachableStateError::CornerTwist.into());
        }
        if self.eo.iter().map(|&o| u32::from(o)).sum::<u32>() % 2 != 0 {
            return Err(UnreachableStateError::EdgeFlip.into());
        }
        if permutation_parity(&self.cp) != permutation_parity(&self.ep) {
            return Err(UnreachableStateError::Parity.into());
        }
        Ok(())
    }

    #[must_use]
    pub fn is_solved(&self) -> bool {
        *self == Self::SOLVED
    }

    #[must_use]
    pub fn corner_permutation(&self) -> &[u8; CORNER_COUNT] {
        &self.cp
    }

    #[must_use]
    pub fn corner_orientation(&self) -> &[u8; CORNER_COUNT] {
        &self.co
    }

    #[must_use]
    pub fn edge_permutation(&self) -> &[u8; EDGE_COUNT] {
        &self.ep
    }

    #[must_use]
    pub fn edge_orientation(&self) -> &[u8; EDGE_COUNT] {
        &self.eo
    }

    /// The group product `self * other`: first `self`, then `other`.
    #[must_use]
    pub fn multiply(&self, other: &Self) -> Self {
        let mut result = Self::SOLVED;
        for i in 0..CORNER_COUNT {
            let from = other.cp[i] as usize;
            result.cp[i] = self.cp[from];
            result.co[i] = (self.co[from] + other.co[i]) % 3;
        }
        for i in 0..EDGE_COUNT {
            let from = other.ep[i] as usize;
            result.ep[i] = self.ep[from];
            result.eo[i] = (self.eo[from] + other.eo[i]) % 2;
        }
        result
    }

    /// The group inverse, so that `c.multiply(&c.inverse())` is solved.
    #[must_use]
    pub fn inverse(&self) -> Self {
        let mut result = Self::SOLVED;
        for i in 0..CORNER_COUNT {
            let to = self.cp[i] as usize;
            result.cp[to] = i as u8;
            result.co[to] = (3 - self.co[i]) % 3;
        }
        for i in 0..EDGE_COUNT {
            let to = self.ep[i] as usize;
            result.ep[to] = i as u8;
            result.eo[to] = self.eo[i];
        }
        result
    }

    /// Whether the cube lies in the phase 2 subgroup `<U, D, R2, L2, F2, B2>`.
    #[must_use]
    pub fn in_phase2_subgroup(&self) -> bool {
        self.co.iter().all(|&o| o == 0)
            && self.eo.iter().all(|&o| o == 0)
            && self.ep[FIRST_SLICE_EDGE as usize..]
                .iter()
                .all(|&e| e >= FIRST_SLICE_EDGE)
    }
}

impl Default for CubieCube {
    fn default() -> Self {
        Self::SOLVED
    }
}

impl fmt::Debug for CubieCube {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let corners = self
            .cp
            .iter()
            .zip(self.co)
            .map(|(&c, o)| format!("{}{o}", CORNER_NAMES[c as usize]))
            .join(" ");
        let edges = self
            .ep
            .iter()
            .zip(self.eo)
            .map(|(&e, o)| format!("{}{o}", EDGE_NAMES[e as usize]))
            .join(" ");
        write!(f, "CubieCube {{ corners: [{corners}], edges: [{edges}] }}")
    }
}

fn check_permutation(kind: &'static str, perm: &[u8]) -> Result<(), MalformedCubeError> {
    let mut seen = 0_u32;
    for &p in perm {
        if p as usize >= perm.len() || seen & (1 << p) != 0 {
            return Err(MalformedCubeError::NotAPermutation {
                kind,
                permutation: perm.to_vec(),
            });
        }
        seen |= 1 << p;
    }
    Ok(())
}

fn check_orientations(
    kind: &'static str,
    orientations: &[u8],
    orientation_count: u8,
) -> Result<(), MalformedCubeError> {
    match orientations
        .iter()
        .position(|&value| value >= orientation_count)
    {
        Some(slot) => Err(MalformedCubeError::OrientationOutOfRange {
            kind,
            slot,
            value: orientations[slot],
        }),
        None => Ok(()),
    }
}

/// `true` for odd permutations.
pub(crate) fn permutation_parity(perm: &[u8]) -> bool {
    let mut odd = false;
    for i in 0..perm.len() {
        for j in i + 1..perm.len() {
            if perm[i] > perm[j] {
                odd = !odd;
            }
        }
    }
    odd
}
