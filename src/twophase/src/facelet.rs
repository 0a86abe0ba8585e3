//! Conversion between [`CubieCube`] and the 54 character facelet string.
//!
//! Faces are listed in the order U, R, F, D, L, B. Each face is read row by
//! row from the top left when looking straight at it, with U viewed with B at
//! the top and D viewed with F at the top. Every facelet holds the letter of
//! the face whose center has its color, so the solved cube is
//! `UUUUUUUUURRRRRRRRRFFFFFFFFFDDDDDDDDDLLLLLLLLLBBBBBBBBB`.

use std::{fmt, str::FromStr};

use itertools::Itertools;

use crate::{
    cube::{
        CORNER_COUNT, CORNER_NAMES, CubeError, CubieCube, EDGE_COUNT, EDGE_NAMES,
        MalformedCubeError,
    },
    moves::Face,
};

pub const FACELET_COUNT: usize = 54;

const U1: usize = 0;
const U2: usize = 1;
const U3: usize = 2;
const U4: usize = 3;
const U6: usize = 5;
const U7: usize = 6;
const U8: usize = 7;
const U9: usize = 8;
const R1: usize = 9;
const R2: usize = 10;
const R3: usize = 11;
const R4: usize = 12;
const R6: usize = 14;
const R7: usize = 15;
const R8: usize = 16;
const R9: usize = 17;
const F1: usize = 18;
const F2: usize = 19;
const F3: usize = 20;
const F4: usize = 21;
const F6: usize = 23;
const F7: usize = 24;
const F8: usize = 25;
const F9: usize = 26;
const D1: usize = 27;
const D2: usize = 28;
const D3: usize = 29;
const D4: usize = 30;
const D6: usize = 32;
const D7: usize = 33;
const D8: usize = 34;
const D9: usize = 35;
const L1: usize = 36;
const L2: usize = 37;
const L3: usize = 38;
const L4: usize = 39;
const L6: usize = 41;
const L7: usize = 42;
const L8: usize = 43;
const L9: usize = 44;
const B1: usize = 45;
const B2: usize = 46;
const B3: usize = 47;
const B4: usize = 48;
const B6: usize = 50;
const B7: usize = 51;
const B8: usize = 52;
const B9: usize = 53;

/// The facelets of each corner slot, starting with its U or D facelet and
/// going clockwise.
const CORNER_FACELETS: [[usize; 3]; CORNER_COUNT] = [
    [U9, R1, F3],
    [U7, F1, L3],
    [U1, L1, B3],
    [U3, B1, R3],
    [D3, F9, R7],
    [D1, L9, F7],
    [D7, B9, L7],
    [D9, R9, B7],
];

const EDGE_FACELETS: [[usize; 2]; EDGE_COUNT] = [
    [U6, R2],
    [U8, F2],
    [U4, L2],
    [U2, B2],
    [D6, R8],
    [D2, F8],
    [D4, L8],
    [D8, B8],
    [F6, R4],
    [F4, L6],
    [B6, L4],
    [B4, R6],
];

const CORNER_COLORS: [[Face; 3]; CORNER_COUNT] = {
    use Face::*;
    [
        [U, R, F],
        [U, F, L],
        [U, L, B],
        [U, B, R],
        [D, F, R],
        [D, L, F],
        [D, B, L],
        [D, R, B],
    ]
};

const EDGE_COLORS: [[Face; 2]; EDGE_COUNT] = {
    use Face::*;
    [
        [U, R],
        [U, F],
        [U, L],
        [U, B],
        [D, R],
        [D, F],
        [D, L],
        [D, B],
        [F, R],
        [F, L],
        [B, L],
        [B, R],
    ]
};

impl CubieCube {
    /// Parse a 54 character facelet string.
    ///
    /// # Errors
    ///
    /// `MalformedCubeError` if the string is not a cube at all: wrong length,
    /// unknown letters, wrong color counts, misplaced centers, color
    /// combinations that no cubie has, or a cubie appearing twice.
    /// `UnreachableStateError` if it is a cube that can't be solved.
    pub fn from_facelets(facelets: &str) -> Result<Self, CubeError> {
        let chars = facelets.chars().collect_vec();
        if chars.len() != FACELET_COUNT {
            return Err(MalformedCubeError::WrongLength(chars.len()).into());
        }

        let faces = chars
            .iter()
            .map(|&c| Face::from_letter(c).ok_or(MalformedCubeError::UnknownColor(c)))
            .collect::<Result<Vec<_>, _>>()?;

        let counts = faces.iter().counts();
        for face in Face::ALL {
            let count = counts.get(&face).copied().unwrap_or(0);
            if count != 9 {
                return Err(MalformedCubeError::WrongColorCount {
                    color: face.letter(),
                    count,
                }
                .into());
            }
        }

        for face in Face::ALL {
            let center = faces[face as usize * 9 + 4];
            if center != face {
                return Err(MalformedCubeError::WrongCenter {
                    face: face.letter(),
                    actual: center.letter(),
                }
                .into());
            }
        }

        let mut cube = CubieCube::SOLVED;

        for (slot, facelet) in CORNER_FACELETS.iter().enumerate() {
            let ori = (0..3)
                .find(|&ori| matches!(faces[facelet[ori]], Face::U | Face::D))
                .ok_or_else(|| unknown_cubie("corner", facelet.iter().map(|&f| faces[f])))?;
            let colors = [
                faces[facelet[ori]],
                faces[facelet[(ori + 1) % 3]],
                faces[facelet[(ori + 2) % 3]],
            ];

            let corner = CORNER_COLORS
                .iter()
                .position(|expected| *expected == colors)
                .ok_or_else(|| unknown_cubie("corner", facelet.iter().map(|&f| faces[f])))?;

            cube.cp[slot] = corner as u8;
            cube.co[slot] = ori as u8;
        }

        for (slot, facelet) in EDGE_FACELETS.iter().enumerate() {
            let colors = [faces[facelet[0]], faces[facelet[1]]];
            let (edge, flip) = EDGE_COLORS
                .iter()
                .enumerate()
                .find_map(|(edge, expected)| {
                    if *expected == colors {
                        Some((edge, 0))
                    } else if expected[0] == colors[1] && expected[1] == colors[0] {
                        Some((edge, 1))
                    } else {
                        None
                    }
                })
                .ok_or_else(|| unknown_cubie("edge", colors.into_iter()))?;

            cube.ep[slot] = edge as u8;
            cube.eo[slot] = flip;
        }

        if let Some(corner) = cube.cp.iter().duplicates().next() {
            return Err(MalformedCubeError::DuplicateCubie {
                kind: "corner",
                name: CORNER_NAMES[*corner as usize],
            }
            .into());
        }
        if let Some(edge) = cube.ep.iter().duplicates().next() {
            return Err(MalformedCubeError::DuplicateCubie {
                kind: "edge",
                name: EDGE_NAMES[*edge as usize],
            }
            .into());
        }

        cube.verify()?;
        Ok(cube)
    }

    /// The facelet string of this cube, the inverse of [`CubieCube::from_facelets`].
    #[must_use]
    pub fn to_facelets(&self) -> String {
        let mut faces = [Face::U; FACELET_COUNT];
        for face in Face::ALL {
            faces[face as usize * 9..face as usize * 9 + 9].fill(face);
        }

        for (slot, facelet) in CORNER_FACELETS.iter().enumerate() {
            let corner = self.cp[slot] as usize;
            let ori = self.co[slot] as usize;
            for n in 0..3 {
                faces[facelet[(n + ori) % 3]] = CORNER_COLORS[corner][n];
            }
        }

        for (slot, facelet) in EDGE_FACELETS.iter().enumerate() {
            let edge = self.ep[slot] as usize;
            let flip = self.eo[slot] as usize;
            for n in 0..2 {
                faces[facelet[(n + flip) % 2]] = EDGE_COLORS[edge][n];
            }
        }

        faces.iter().map(|face| face.letter()).collect()
    }
}

fn unknown_cubie(kind: &'static str, colors: impl Iterator<Item = Face>) -> MalformedCubeError {
    MalformedCubeError::UnknownCubie {
        kind,
        colors: colors.map(Face::letter).collect(),
    }
}

impl FromStr for CubieCube {
    type Err = CubeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_facelets(s)
    }
}

impl fmt::Display for CubieCube {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_facelets())
    }
}
