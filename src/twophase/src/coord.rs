//! Coordinates: small integers that each capture one projection of a
//! [`CubieCube`], and the move tables that update them without going back to
//! the full cube.

use std::time::Instant;

use log::{debug, info};

use crate::{
    BINOMIAL, FACT,
    cube::{CORNER_COUNT, CubieCube, EDGE_COUNT, FIRST_SLICE_EDGE},
    moves::Move,
    start, success, working,
};

/// A set of moves that a search or table is restricted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GeneratorSet {
    /// All 18 moves.
    All,
    /// The 10 moves of `<U, D, R2, L2, F2, B2>`.
    Phase2,
}

impl GeneratorSet {
    #[must_use]
    pub fn moves(self) -> &'static [Move] {
        match self {
            GeneratorSet::All => &Move::ALL,
            GeneratorSet::Phase2 => &Move::PHASE2,
        }
    }

    /// The position of `move_` among [`GeneratorSet::moves`].
    #[must_use]
    pub fn column(self, move_: Move) -> Option<usize> {
        match self {
            GeneratorSet::All => Some(move_.index()),
            GeneratorSet::Phase2 => move_.phase2_index(),
        }
    }

    /// Stable identifier written into persisted tables.
    #[must_use]
    pub fn id(self) -> u8 {
        match self {
            GeneratorSet::All => 0,
            GeneratorSet::Phase2 => 1,
        }
    }
}

/// One coordinate kind. Conversions go both ways: any cube projects to a
/// coordinate, and any coordinate has a representative cube that projects
/// back to it. Representatives need not be reachable cubes.
pub trait Coordinate {
    const NAME: &'static str;
    /// The coordinate ranges over `0..COUNT`.
    const COUNT: usize;
    /// The moves under which the coordinate is well defined.
    const GENERATORS: GeneratorSet;

    fn from_cube(cube: &CubieCube) -> u16;

    fn representative(coord: u16) -> CubieCube;
}

pub struct Twist;
pub struct Flip;
pub struct Slice;
pub struct CornerPerm;
pub struct EdgePermNonSlice;
pub struct EdgePermSlice;

impl Coordinate for Twist {
    const NAME: &'static str = "twist";
    const COUNT: usize = 2187;
    const GENERATORS: GeneratorSet = GeneratorSet::All;

    fn from_cube(cube: &CubieCube) -> u16 {
        cube.co[..CORNER_COUNT - 1]
            .iter()
            .fold(0, |acc, &o| acc * 3 + u16::from(o))
    }

    fn representative(mut coord: u16) -> CubieCube {
        let mut cube = CubieCube::SOLVED;
        let mut sum = 0;
        for slot in (0..CORNER_COUNT - 1).rev() {
            cube.co[slot] = (coord % 3) as u8;
            sum += cube.co[slot];
            coord /= 3;
        }
        cube.co[CORNER_COUNT - 1] = (3 - sum % 3) % 3;
        cube
    }
}

impl Coordinate for Flip {
    const NAME: &'static str = "flip";
    const COUNT: usize = 2048;
    const GENERATORS: GeneratorSet = GeneratorSet::All;

    fn from_cube(cube: &CubieCube) -> u16 {
        cube.eo[..EDGE_COUNT - 1]
            .iter()
            .fold(0, |acc, &o| acc * 2 + u16::from(o))
    }

    fn representative(mut coord: u16) -> CubieCube {
        let mut cube = CubieCube::SOLVED;
        let mut sum = 0;
        for slot in (0..EDGE_COUNT - 1).rev() {
            cube.eo[slot] = (coord % 2) as u8;
            sum += cube.eo[slot];
            coord /= 2;
        }
        cube.eo[EDGE_COUNT - 1] = sum % 2;
        cube
    }
}

impl Coordinate for Slice {
    const NAME: &'static str = "slice";
    const COUNT: usize = 495;
    const GENERATORS: GeneratorSet = GeneratorSet::All;

    /// Ranks the set of slots holding slice edges, scanning from BR down so
    /// that the solved placement is 0.
    fn from_cube(cube: &CubieCube) -> u16 {
        let mut coord = 0;
        let mut found = 0;
        for slot in (0..EDGE_COUNT).rev() {
            if cube.ep[slot] >= FIRST_SLICE_EDGE {
                found += 1;
                coord += BINOMIAL[EDGE_COUNT - 1 - slot][found];
            }
        }
        coord as u16
    }

    fn representative(coord: u16) -> CubieCube {
        let mut cube = CubieCube::SOLVED;
        let mut remaining = u32::from(coord);
        let mut left = 4;
        let mut slice_edges = FIRST_SLICE_EDGE..;
        let mut other_edges = 0..;
        for slot in 0..EDGE_COUNT {
            let rank = BINOMIAL[EDGE_COUNT - 1 - slot][left];
            cube.ep[slot] = if left > 0 && remaining >= rank {
                remaining -= rank;
                left -= 1;
                slice_edges.next()
            } else {
                other_edges.next()
            }
            .unwrap_or_default();
        }
        cube
    }
}

impl Coordinate for CornerPerm {
    const NAME: &'static str = "corner permutation";
    const COUNT: usize = 40320;
    const GENERATORS: GeneratorSet = GeneratorSet::All;

    fn from_cube(cube: &CubieCube) -> u16 {
        rank_permutation(&cube.cp)
    }

    fn representative(coord: u16) -> CubieCube {
        let mut cube = CubieCube::SOLVED;
        unrank_permutation(coord, &mut cube.cp);
        cube
    }
}

impl Coordinate for EdgePermNonSlice {
    const NAME: &'static str = "non-slice edge permutation";
    const COUNT: usize = 40320;
    const GENERATORS: GeneratorSet = GeneratorSet::Phase2;

    fn from_cube(cube: &CubieCube) -> u16 {
        let mut edges = [0; FIRST_SLICE_EDGE as usize];
        for (dst, &edge) in edges
            .iter_mut()
            .zip(cube.ep.iter().filter(|&&e| e < FIRST_SLICE_EDGE))
        {
            *dst = edge;
        }
        rank_permutation(&edges)
    }

    fn representative(coord: u16) -> CubieCube {
        let mut cube = CubieCube::SOLVED;
        unrank_permutation(coord, &mut cube.ep[..FIRST_SLICE_EDGE as usize]);
        cube
    }
}

impl Coordinate for EdgePermSlice {
    const NAME: &'static str = "slice edge permutation";
    const COUNT: usize = 24;
    const GENERATORS: GeneratorSet = GeneratorSet::Phase2;

    fn from_cube(cube: &CubieCube) -> u16 {
        let mut edges = [0; EDGE_COUNT - FIRST_SLICE_EDGE as usize];
        for (dst, &edge) in edges
            .iter_mut()
            .zip(cube.ep.iter().filter(|&&e| e >= FIRST_SLICE_EDGE))
        {
            *dst = edge - FIRST_SLICE_EDGE;
        }
        rank_permutation(&edges)
    }

    fn representative(coord: u16) -> CubieCube {
        let mut cube = CubieCube::SOLVED;
        let slice = &mut cube.ep[FIRST_SLICE_EDGE as usize..];
        unrank_permutation(coord, slice);
        for edge in slice {
            *edge += FIRST_SLICE_EDGE;
        }
        cube
    }
}

/// Lehmer code of a permutation of `0..perm.len()`, 0 for the identity.
fn rank_permutation(perm: &[u8]) -> u16 {
    let n = perm.len();
    let mut rank = 0;
    for i in 0..n {
        let smaller_after = perm[i + 1..].iter().filter(|&&p| p < perm[i]).count();
        rank += smaller_after as u32 * FACT[n - 1 - i];
    }
    rank as u16
}

/// Inverse of [`rank_permutation`], writing into `perm`.
fn unrank_permutation(mut rank: u16, perm: &mut [u8]) {
    let n = perm.len();
    let mut unused = (0..n as u8).collect::<Vec<_>>();
    for (i, dst) in perm.iter_mut().enumerate() {
        let fact = FACT[n - 1 - i] as u16;
        *dst = unused.remove((rank / fact) as usize);
        rank %= fact;
    }
}

impl CubieCube {
    #[must_use]
    pub fn twist(&self) -> u16 {
        Twist::from_cube(self)
    }

    #[must_use]
    pub fn flip(&self) -> u16 {
        Flip::from_cube(self)
    }

    #[must_use]
    pub fn slice(&self) -> u16 {
        Slice::from_cube(self)
    }

    #[must_use]
    pub fn corner_perm(&self) -> u16 {
        CornerPerm::from_cube(self)
    }

    #[must_use]
    pub fn edge_perm_non_slice(&self) -> u16 {
        EdgePermNonSlice::from_cube(self)
    }

    #[must_use]
    pub fn edge_perm_slice(&self) -> u16 {
        EdgePermSlice::from_cube(self)
    }
}

/// The coordinates phase 1 drives to zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Phase1Coord {
    pub twist: u16,
    pub flip: u16,
    pub slice: u16,
}

impl Phase1Coord {
    #[must_use]
    pub fn from_cube(cube: &CubieCube) -> Self {
        Self {
            twist: cube.twist(),
            flip: cube.flip(),
            slice: cube.slice(),
        }
    }

    #[must_use]
    pub fn is_solved(self) -> bool {
        self == Self::default()
    }
}

/// The coordinates phase 2 drives to zero. Only meaningful for cubes in the
/// phase 2 subgroup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Phase2Coord {
    pub corner_perm: u16,
    pub edge_perm_non_slice: u16,
    pub edge_perm_slice: u16,
}

impl Phase2Coord {
    #[must_use]
    pub fn from_cube(cube: &CubieCube) -> Self {
        Self {
            corner_perm: cube.corner_perm(),
            edge_perm_non_slice: cube.edge_perm_non_slice(),
            edge_perm_slice: cube.edge_perm_slice(),
        }
    }

    #[must_use]
    pub fn is_solved(self) -> bool {
        self == Self::default()
    }
}

/// Dense `COUNT × moves` transition table of one coordinate.
pub struct MoveTable {
    table: Box<[u16]>,
    count: usize,
    generators: GeneratorSet,
}

impl MoveTable {
    /// Tabulate `C` under every move of `C::GENERATORS`, by applying each
    /// move to each representative.
    #[must_use]
    pub fn generate<C: Coordinate>() -> Self {
        let moves = C::GENERATORS.moves();
        let mut table = Vec::with_capacity(C::COUNT * moves.len());
        for coord in 0..C::COUNT {
            let cube = C::representative(coord as u16);
            table.extend(moves.iter().map(|&m| C::from_cube(&cube.apply(m))));
        }
        Self {
            table: table.into_boxed_slice(),
            count: C::COUNT,
            generators: C::GENERATORS,
        }
    }

    /// The coordinate reached by the move in column `column` of this table's
    /// generator set.
    #[inline]
    #[must_use]
    pub fn apply(&self, coord: u16, column: usize) -> u16 {
        self.table[coord as usize * self.generators.moves().len() + column]
    }

    /// # Panics
    ///
    /// If `move_` is not in this table's generator set.
    #[must_use]
    pub fn apply_move(&self, coord: u16, move_: Move) -> u16 {
        let column = self
            .generators
            .column(move_)
            .unwrap_or_else(|| panic!("{move_} is not tabulated"));
        self.apply(coord, column)
    }

    #[must_use]
    pub fn count(&self) -> usize {
        self.count
    }

    #[must_use]
    pub fn generators(&self) -> GeneratorSet {
        self.generators
    }
}

/// The move tables of all six coordinates.
pub struct MoveTables {
    pub twist: MoveTable,
    pub flip: MoveTable,
    pub slice: MoveTable,
    pub corner_perm: MoveTable,
    pub edge_perm_non_slice: MoveTable,
    pub edge_perm_slice: MoveTable,
}

impl MoveTables {
    #[must_use]
    pub fn generate() -> Self {
        info!(start!("Generating move tables"));
        let now = Instant::now();

        let tables = Self {
            twist: timed::<Twist>(),
            flip: timed::<Flip>(),
            slice: timed::<Slice>(),
            corner_perm: timed::<CornerPerm>(),
            edge_perm_non_slice: timed::<EdgePermNonSlice>(),
            edge_perm_slice: timed::<EdgePermSlice>(),
        };

        info!(success!("Generated move tables in {:.3}s"), now.elapsed().as_secs_f64());
        tables
    }

    /// Advance phase 1 coordinates by one move.
    #[inline]
    #[must_use]
    pub fn apply_phase1(&self, coord: Phase1Coord, move_: Move) -> Phase1Coord {
        let column = move_.index();
        Phase1Coord {
            twist: self.twist.apply(coord.twist, column),
            flip: self.flip.apply(coord.flip, column),
            slice: self.slice.apply(coord.slice, column),
        }
    }

    /// Advance phase 2 coordinates by one move of [`Move::PHASE2`], given by
    /// its position in that list.
    #[inline]
    #[must_use]
    pub fn apply_phase2(&self, coord: Phase2Coord, phase2_index: usize) -> Phase2Coord {
        Phase2Coord {
            corner_perm: self
                .corner_perm
                .apply(coord.corner_perm, Move::PHASE2[phase2_index].index()),
            edge_perm_non_slice: self
                .edge_perm_non_slice
                .apply(coord.edge_perm_non_slice, phase2_index),
            edge_perm_slice: self
                .edge_perm_slice
                .apply(coord.edge_perm_slice, phase2_index),
        }
    }
}

fn timed<C: Coordinate>() -> MoveTable {
    let now = Instant::now();
    let table = MoveTable::generate::<C>();
    debug!(
        working!("Generated {} move table ({} entries) in {:.3}s"),
        C::NAME,
        table.table.len(),
        now.elapsed().as_secs_f64()
    );
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::moves::{MoveSequence, apply_moves};

    fn round_trip<C: Coordinate>() {
        for coord in 0..C::COUNT {
            let coord = coord as u16;
            assert_eq!(C::from_cube(&C::representative(coord)), coord, "{}", C::NAME);
        }
    }

    fn agrees_with_cube<C: Coordinate>(table: &MoveTable, cubes: &[CubieCube]) {
        for cube in cubes {
            for &move_ in C::GENERATORS.moves() {
                assert_eq!(
                    table.apply_move(C::from_cube(cube), move_),
                    C::from_cube(&cube.apply(move_)),
                    "{} {move_}",
                    C::NAME
                );
            }
        }
    }

    #[test]
    fn solved_coordinates_are_zero() {
        let solved = CubieCube::solved();
        assert_eq!(solved.twist(), 0);
        assert_eq!(solved.flip(), 0);
        assert_eq!(solved.slice(), 0);
        assert_eq!(solved.corner_perm(), 0);
        assert_eq!(solved.edge_perm_non_slice(), 0);
        assert_eq!(solved.edge_perm_slice(), 0);
        assert!(Phase1Coord::from_cube(&solved).is_solved());
        assert!(Phase2Coord::from_cube(&solved).is_solved());
    }

    #[test]
    fn coordinates_round_trip() {
        round_trip::<Twist>();
        round_trip::<Flip>();
        round_trip::<Slice>();
        round_trip::<CornerPerm>();
        round_trip::<EdgePermNonSlice>();
        round_trip::<EdgePermSlice>();
    }

    #[test]
    fn representatives_have_valid_orientations() {
        for coord in 0..Twist::COUNT {
            let cube = Twist::representative(coord as u16);
            assert_eq!(cube.co.iter().map(|&o| u32::from(o)).sum::<u32>() % 3, 0);
        }
        for coord in 0..Flip::COUNT {
            let cube = Flip::representative(coord as u16);
            assert_eq!(cube.eo.iter().map(|&o| u32::from(o)).sum::<u32>() % 2, 0);
        }
    }

    #[test]
    fn coordinates_stay_in_range() {
        for _ in 0..200 {
            let cube = CubieCube::SOLVED.apply_sequence(MoveSequence::random(25).moves());
            assert!((cube.twist() as usize) < Twist::COUNT);
            assert!((cube.flip() as usize) < Flip::COUNT);
            assert!((cube.slice() as usize) < Slice::COUNT);
            assert!((cube.corner_perm() as usize) < CornerPerm::COUNT);
            assert!((cube.edge_perm_non_slice() as usize) < EdgePermNonSlice::COUNT);
            assert!((cube.edge_perm_slice() as usize) < EdgePermSlice::COUNT);
        }
    }

    #[test]
    fn phase2_moves_keep_phase1_solved() {
        let cube = apply_moves(&CubieCube::SOLVED, "U R2 D' F2 L2 U2 B2 D");
        assert!(cube.in_phase2_subgroup());
        assert!(Phase1Coord::from_cube(&cube).is_solved());
        assert!(!Phase2Coord::from_cube(&cube).is_solved());

        let cube = apply_moves(&CubieCube::SOLVED, "R");
        assert!(!Phase1Coord::from_cube(&cube).is_solved());
    }

    #[test]
    fn move_tables_agree_with_cubes() {
        let tables = MoveTables::generate();

        let scrambled = (0..50)
            .map(|_| CubieCube::SOLVED.apply_sequence(MoveSequence::random(20).moves()))
            .collect::<Vec<_>>();
        agrees_with_cube::<Twist>(&tables.twist, &scrambled);
        agrees_with_cube::<Flip>(&tables.flip, &scrambled);
        agrees_with_cube::<Slice>(&tables.slice, &scrambled);
        agrees_with_cube::<CornerPerm>(&tables.corner_perm, &scrambled);

        let phase2 = (0..50)
            .map(|_| {
                let moves = (0..20)
                    .map(|_| Move::PHASE2[fastrand::usize(..Move::PHASE2.len())])
                    .collect::<Vec<_>>();
                CubieCube::SOLVED.apply_sequence(&moves)
            })
            .collect::<Vec<_>>();
        agrees_with_cube::<CornerPerm>(&tables.corner_perm, &phase2);
        agrees_with_cube::<EdgePermNonSlice>(&tables.edge_perm_non_slice, &phase2);
        agrees_with_cube::<EdgePermSlice>(&tables.edge_perm_slice, &phase2);

        for cube in &phase2 {
            let coord = Phase2Coord::from_cube(cube);
            for (i, &move_) in Move::PHASE2.iter().enumerate() {
                assert_eq!(
                    tables.apply_phase2(coord, i),
                    Phase2Coord::from_cube(&cube.apply(move_))
                );
            }
        }
        for cube in &scrambled {
            let coord = Phase1Coord::from_cube(cube);
            for move_ in Move::ALL {
                assert_eq!(
                    tables.apply_phase1(coord, move_),
                    Phase1Coord::from_cube(&cube.apply(move_))
                );
            }
        }
    }

    #[test]
    fn generator_sets() {
        assert_eq!(GeneratorSet::All.moves().len(), 18);
        assert_eq!(GeneratorSet::Phase2.moves().len(), 10);
        for (i, &move_) in GeneratorSet::Phase2.moves().iter().enumerate() {
            assert_eq!(GeneratorSet::Phase2.column(move_), Some(i));
        }
        assert_eq!(GeneratorSet::Phase2.column(Move::ALL[3]), None);
        assert_ne!(GeneratorSet::All.id(), GeneratorSet::Phase2.id());
    }
}
