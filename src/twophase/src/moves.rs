//! The 18 face turns and their action on a [`CubieCube`].

use std::{fmt, str::FromStr, sync::LazyLock};

use itertools::Itertools;

use crate::cube::{CubieCube, MalformedCubeError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Face {
    U,
    R,
    F,
    D,
    L,
    B,
}

impl Face {
    pub const ALL: [Self; 6] = {
        use Face::*;
        let v = [U, R, F, D, L, B];

        let mut i = 0;
        while i < v.len() {
            assert!(i == v[i] as usize);
            i += 1;
        }

        v
    };

    #[must_use]
    pub fn letter(self) -> char {
        match self {
            Face::U => 'U',
            Face::R => 'R',
            Face::F => 'F',
            Face::D => 'D',
            Face::L => 'L',
            Face::B => 'B',
        }
    }

    #[must_use]
    pub fn from_letter(letter: char) -> Option<Self> {
        match letter {
            'U' => Some(Face::U),
            'R' => Some(Face::R),
            'F' => Some(Face::F),
            'D' => Some(Face::D),
            'L' => Some(Face::L),
            'B' => Some(Face::B),
            _ => None,
        }
    }

    /// The face on the other side of the cube.
    #[must_use]
    pub fn opposite(self) -> Self {
        Self::ALL[(self as usize + 3) % 6]
    }
}

/// A clockwise quarter, half, or counterclockwise quarter turn of one face.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Move {
    face: Face,
    /// Clockwise quarter turns, one of 1, 2, 3
    turns: u8,
}

impl Move {
    /// All 18 moves in canonical order: faces U, R, F, D, L, B, each as a
    /// clockwise, half, then counterclockwise turn. `Move::ALL[m.index()] == m`.
    pub const ALL: [Self; 18] = {
        let mut all = [Move {
            face: Face::U,
            turns: 1,
        }; 18];
        let mut i = 0;
        while i < 18 {
            all[i] = Move {
                face: Face::ALL[i / 3],
                turns: (i % 3) as u8 + 1,
            };
            i += 1;
        }
        all
    };

    /// The ten moves that keep a cube inside the phase 2 subgroup.
    pub const PHASE2: [Self; 10] = [
        Move::new(Face::U, 1),
        Move::new(Face::U, 2),
        Move::new(Face::U, 3),
        Move::new(Face::R, 2),
        Move::new(Face::F, 2),
        Move::new(Face::D, 1),
        Move::new(Face::D, 2),
        Move::new(Face::D, 3),
        Move::new(Face::L, 2),
        Move::new(Face::B, 2),
    ];

    /// # Panics
    ///
    /// If `turns` is not 1, 2, or 3.
    #[must_use]
    pub const fn new(face: Face, turns: u8) -> Self {
        assert!(matches!(turns, 1..=3));
        Self { face, turns }
    }

    #[must_use]
    pub fn face(self) -> Face {
        self.face
    }

    /// Clockwise quarter turns, one of 1, 2, 3.
    #[must_use]
    pub fn turns(self) -> u8 {
        self.turns
    }

    /// Position in [`Move::ALL`].
    #[must_use]
    pub fn index(self) -> usize {
        self.face as usize * 3 + self.turns as usize - 1
    }

    /// Position in [`Move::PHASE2`], if this move keeps phase 2 states in
    /// phase 2.
    #[must_use]
    pub fn phase2_index(self) -> Option<usize> {
        Self::PHASE2.iter().position(|&m| m == self)
    }

    #[must_use]
    pub fn is_phase2(self) -> bool {
        matches!(self.face, Face::U | Face::D) || self.turns == 2
    }

    #[must_use]
    pub fn inverse(self) -> Self {
        Self {
            face: self.face,
            turns: 4 - self.turns,
        }
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let suffix = match self.turns {
            1 => "",
            2 => "2",
            _ => "'",
        };
        write!(f, "{}{suffix}", self.face.letter())
    }
}

impl fmt::Debug for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl FromStr for Move {
    type Err = MalformedCubeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || MalformedCubeError::InvalidMoveToken(s.to_owned());
        let mut chars = s.chars();
        let face = chars.next().and_then(Face::from_letter).ok_or_else(invalid)?;
        let turns = match chars.as_str() {
            "" | "1" => 1,
            "2" | "2'" => 2,
            "'" | "3" => 3,
            _ => return Err(invalid()),
        };
        Ok(Move::new(face, turns))
    }
}

/// An ordered list of moves, printed and parsed as space separated tokens.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct MoveSequence(pub Vec<Move>);

impl MoveSequence {
    #[must_use]
    pub fn new(moves: Vec<Move>) -> Self {
        Self(moves)
    }

    #[must_use]
    pub fn moves(&self) -> &[Move] {
        &self.0
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The sequence that undoes this one.
    #[must_use]
    pub fn inverse(&self) -> Self {
        Self(self.0.iter().rev().map(|m| m.inverse()).collect())
    }

    /// A random sequence of `len` moves in which no two consecutive moves turn
    /// the same face.
    #[must_use]
    pub fn random(len: usize) -> Self {
        let mut moves: Vec<Move> = Vec::with_capacity(len);
        while moves.len() < len {
            let move_ = Move::ALL[fastrand::usize(..Move::ALL.len())];
            if moves.last().is_some_and(|last| last.face == move_.face) {
                continue;
            }
            moves.push(move_);
        }
        Self(moves)
    }
}

impl fmt::Display for MoveSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.iter().format(" "))
    }
}

impl FromStr for MoveSequence {
    type Err = MalformedCubeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.split_whitespace()
            .map(str::parse)
            .collect::<Result<_, _>>()
            .map(Self)
    }
}

impl From<Vec<Move>> for MoveSequence {
    fn from(moves: Vec<Move>) -> Self {
        Self(moves)
    }
}

/// The cubie transformation of each clockwise quarter turn, in `Face::ALL`
/// order.
const BASIC_MOVES: [CubieCube; 6] = [
    // U
    CubieCube {
        cp: [3, 0, 1, 2, 4, 5, 6, 7],
        co: [0; 8],
        ep: [3, 0, 1, 2, 4, 5, 6, 7, 8, 9, 10, 11],
        eo: [0; 12],
    },
    // R
    CubieCube {
        cp: [4, 1, 2, 0, 7, 5, 6, 3],
        co: [2, 0, 0, 1, 1, 0, 0, 2],
        ep: [8, 1, 2, 3, 11, 5, 6, 7, 4, 9, 10, 0],
        eo: [0; 12],
    },
    // F
    CubieCube {
        cp: [1, 5, 2, 3, 0, 4, 6, 7],
        co: [1, 2, 0, 0, 2, 1, 0, 0],
        ep: [0, 9, 2, 3, 4, 8, 6, 7, 1, 5, 10, 11],
        eo: [0, 1, 0, 0, 0, 1, 0, 0, 1, 1, 0, 0],
    },
    // D
    CubieCube {
        cp: [0, 1, 2, 3, 5, 6, 7, 4],
        co: [0; 8],
        ep: [0, 1, 2, 3, 5, 6, 7, 4, 8, 9, 10, 11],
        eo: [0; 12],
    },
    // L
    CubieCube {
        cp: [0, 2, 6, 3, 4, 1, 5, 7],
        co: [0, 1, 2, 0, 0, 2, 1, 0],
        ep: [0, 1, 10, 3, 4, 5, 9, 7, 8, 2, 6, 11],
        eo: [0; 12],
    },
    // B
    CubieCube {
        cp: [0, 1, 3, 7, 4, 5, 2, 6],
        co: [0, 0, 1, 2, 0, 0, 2, 1],
        ep: [0, 1, 2, 11, 4, 5, 6, 10, 8, 9, 3, 7],
        eo: [0, 0, 0, 1, 0, 0, 0, 1, 0, 0, 1, 1],
    },
];

/// The cubie transformation of every move, indexed by [`Move::index`].
static MOVE_CUBES: LazyLock<[CubieCube; 18]> = LazyLock::new(|| {
    let mut cubes = [CubieCube::SOLVED; 18];
    for move_ in Move::ALL {
        let basic = &BASIC_MOVES[move_.face as usize];
        let mut cube = CubieCube::SOLVED;
        for _ in 0..move_.turns {
            cube = cube.multiply(basic);
        }
        cubes[move_.index()] = cube;
    }
    cubes
});

impl CubieCube {
    /// The state reached by turning `move_` on this cube.
    #[must_use]
    pub fn apply(&self, move_: Move) -> Self {
        self.multiply(&MOVE_CUBES[move_.index()])
    }

    #[must_use]
    pub fn apply_sequence(&self, moves: &[Move]) -> Self {
        moves.iter().fold(*self, |cube, &move_| cube.apply(move_))
    }

    /// The cube reached from solved by a scramble such as `"R U R' U'"`.
    ///
    /// # Errors
    ///
    /// If a token is not a move.
    pub fn from_scramble(scramble: &str) -> Result<Self, MalformedCubeError> {
        let moves: MoveSequence = scramble.parse()?;
        Ok(Self::SOLVED.apply_sequence(moves.moves()))
    }
}

/// A utility function for testing. Not optimized.
#[cfg(test)]
pub(crate) fn apply_moves(cube: &CubieCube, moves: &str) -> CubieCube {
    let moves: MoveSequence = moves.parse().unwrap();
    cube.apply_sequence(moves.moves())
}
