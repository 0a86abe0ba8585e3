//! Exact distance tables over pairs of coordinates, used as admissible
//! heuristics by both search phases.

use std::{
    fmt,
    io::{self, Read, Write},
    sync::atomic::{AtomicU8, AtomicUsize, Ordering},
    time::Instant,
};

use log::{debug, info};
use thiserror::Error;

use crate::{
    coord::{
        CornerPerm, Coordinate, EdgePermNonSlice, EdgePermSlice, Flip, GeneratorSet, MoveTable,
        MoveTables, Slice, Twist,
    },
    start, success, working,
};

const UNVISITED: u8 = u8::MAX;
/// Frontier entries claimed by a worker at a time.
const CHUNK_SIZE: usize = 4096;

const MAGIC: &[u8; 8] = b"TWOPHASE";
const FORMAT_VERSION: u16 = 2;

/// The coordinate pairs the solver keeps distance tables for. The id of a
/// kind is written to the file header, so tables of the same shape can't
/// stand in for each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TableKind {
    TwistSlice,
    FlipSlice,
    CornerSlice,
    EdgeSlice,
}

impl TableKind {
    pub const ALL: [TableKind; 4] = [
        TableKind::TwistSlice,
        TableKind::FlipSlice,
        TableKind::CornerSlice,
        TableKind::EdgeSlice,
    ];

    #[must_use]
    pub fn id(self) -> u8 {
        match self {
            TableKind::TwistSlice => 0,
            TableKind::FlipSlice => 1,
            TableKind::CornerSlice => 2,
            TableKind::EdgeSlice => 3,
        }
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            TableKind::TwistSlice => "twist × slice",
            TableKind::FlipSlice => "flip × slice",
            TableKind::CornerSlice => "corner permutation × slice edge permutation",
            TableKind::EdgeSlice => "edge permutation × slice edge permutation",
        }
    }

    /// Name of the cache file inside the table directory.
    #[must_use]
    pub fn file_name(self) -> &'static str {
        match self {
            TableKind::TwistSlice => "twist_slice.bin",
            TableKind::FlipSlice => "flip_slice.bin",
            TableKind::CornerSlice => "corner_slice.bin",
            TableKind::EdgeSlice => "edge_slice.bin",
        }
    }

    #[must_use]
    pub fn generators(self) -> GeneratorSet {
        match self {
            TableKind::TwistSlice | TableKind::FlipSlice => GeneratorSet::All,
            TableKind::CornerSlice | TableKind::EdgeSlice => GeneratorSet::Phase2,
        }
    }

    /// Number of values of the first and the second coordinate.
    #[must_use]
    pub fn sizes(self) -> (usize, usize) {
        match self {
            TableKind::TwistSlice => (Twist::COUNT, Slice::COUNT),
            TableKind::FlipSlice => (Flip::COUNT, Slice::COUNT),
            TableKind::CornerSlice => (CornerPerm::COUNT, EdgePermSlice::COUNT),
            TableKind::EdgeSlice => (EdgePermNonSlice::COUNT, EdgePermSlice::COUNT),
        }
    }

    /// Upper bound on any entry: every phase 1 state is within 12 moves of
    /// the subgroup and every phase 2 state within 18 of solved.
    #[must_use]
    pub fn distance_bound(self) -> u8 {
        match self.generators() {
            GeneratorSet::All => 12,
            GeneratorSet::Phase2 => 18,
        }
    }

    #[must_use]
    pub fn move_tables(self, moves: &MoveTables) -> (&MoveTable, &MoveTable) {
        match self {
            TableKind::TwistSlice => (&moves.twist, &moves.slice),
            TableKind::FlipSlice => (&moves.flip, &moves.slice),
            TableKind::CornerSlice => (&moves.corner_perm, &moves.edge_perm_slice),
            TableKind::EdgeSlice => (&moves.edge_perm_non_slice, &moves.edge_perm_slice),
        }
    }

    /// The header a table of this kind is written with.
    #[must_use]
    pub fn header(self) -> TableHeader {
        let (size_a, size_b) = self.sizes();
        TableHeader {
            version: FORMAT_VERSION,
            table: self.id(),
            generators: self.generators().id(),
            size_a: size_a as u32,
            size_b: size_b as u32,
        }
    }
}

impl fmt::Display for TableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// `distance[a * size_b + b]` is the number of moves of the generator set
/// needed to bring the coordinate pair `(a, b)` to `(0, 0)`.
#[derive(Clone, PartialEq, Eq)]
pub struct PruningTable {
    data: Box<[u8]>,
    kind: TableKind,
    size_b: usize,
    max_distance: u8,
}

/// What a persisted table must match to be reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableHeader {
    pub version: u16,
    pub table: u8,
    pub generators: u8,
    pub size_a: u32,
    pub size_b: u32,
}

impl fmt::Display for TableHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "v{} table {} generators {} ({} × {})",
            self.version, self.table, self.generators, self.size_a, self.size_b
        )
    }
}

#[derive(Error, Debug)]
pub enum TableLoadError {
    #[error("Could not read the table: {0}")]
    Io(#[from] io::Error),
    #[error("Not a pruning table file")]
    BadMagic,
    #[error("Table header {found} does not match the expected {expected}")]
    HeaderMismatch {
        expected: TableHeader,
        found: TableHeader,
    },
    #[error("The table ends early")]
    Truncated,
    #[error("The table is followed by unexpected data")]
    TrailingData,
    #[error("The table has an impossible distance at index {0}")]
    Corrupt(usize),
}

impl PruningTable {
    /// Breadth-first search from `(0, 0)` over the generators of `kind`,
    /// expanding each layer on `threads` worker threads.
    ///
    /// # Panics
    ///
    /// If a move table does not cover every move of the generators.
    #[must_use]
    pub fn generate(kind: TableKind, moves: &MoveTables, threads: usize) -> Self {
        info!(start!("Generating {} pruning table"), kind);
        let now = Instant::now();

        let (a, b) = kind.move_tables(moves);
        let generators = kind.generators();
        let size_a = a.count();
        let size_b = b.count();
        let a_columns = columns(a, generators);
        let b_columns = columns(b, generators);
        let threads = threads.max(1);

        let distances = (0..size_a * size_b)
            .map(|_| AtomicU8::new(UNVISITED))
            .collect::<Vec<_>>();
        distances[0].store(0, Ordering::Relaxed);

        let mut frontier = vec![0_u32];
        let mut depth = 0_u8;
        while !frontier.is_empty() {
            debug!(
                working!("{} depth {}: {} states"),
                kind,
                depth,
                frontier.len()
            );

            let next_depth = depth + 1;
            let next_chunk = AtomicUsize::new(0);
            let expand = || {
                let mut next_frontier = vec![];
                loop {
                    let start = next_chunk.fetch_add(CHUNK_SIZE, Ordering::Relaxed);
                    if start >= frontier.len() {
                        break next_frontier;
                    }
                    let end = (start + CHUNK_SIZE).min(frontier.len());
                    for &index in &frontier[start..end] {
                        let index = index as usize;
                        let coord_a = (index / size_b) as u16;
                        let coord_b = (index % size_b) as u16;
                        for (&column_a, &column_b) in a_columns.iter().zip(&b_columns) {
                            let next = a.apply(coord_a, column_a) as usize * size_b
                                + b.apply(coord_b, column_b) as usize;
                            if distances[next]
                                .compare_exchange(
                                    UNVISITED,
                                    next_depth,
                                    Ordering::Relaxed,
                                    Ordering::Relaxed,
                                )
                                .is_ok()
                            {
                                next_frontier.push(next as u32);
                            }
                        }
                    }
                }
            };

            frontier = if threads == 1 || frontier.len() <= CHUNK_SIZE {
                expand()
            } else {
                crossbeam::thread::scope(|s| {
                    let handles = (0..threads)
                        .map(|_| s.spawn(|_| expand()))
                        .collect::<Vec<_>>();
                    handles
                        .into_iter()
                        .flat_map(|handle| {
                            handle
                                .join()
                                .unwrap_or_else(|e| std::panic::resume_unwind(e))
                        })
                        .collect()
                })
                .unwrap_or_else(|e| std::panic::resume_unwind(e))
            };
            depth = next_depth;
        }

        let data = distances
            .into_iter()
            .map(AtomicU8::into_inner)
            .collect::<Box<[u8]>>();
        let max_distance = depth.saturating_sub(1);

        info!(
            success!("Generated {} pruning table ({} entries, max distance {}) in {:.3}s"),
            kind,
            data.len(),
            max_distance,
            now.elapsed().as_secs_f64()
        );

        Self {
            data,
            kind,
            size_b,
            max_distance,
        }
    }

    /// Lower bound on the moves needed to bring `(a, b)` to `(0, 0)`.
    #[inline]
    #[must_use]
    pub fn distance(&self, a: u16, b: u16) -> u8 {
        self.data[a as usize * self.size_b + b as usize]
    }

    #[must_use]
    pub fn kind(&self) -> TableKind {
        self.kind
    }

    #[must_use]
    pub fn max_distance(&self) -> u8 {
        self.max_distance
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    #[must_use]
    pub fn header(&self) -> TableHeader {
        self.kind.header()
    }

    /// # Errors
    ///
    /// If writing fails.
    pub fn write_to(&self, writer: &mut impl Write) -> io::Result<()> {
        let header = self.header();
        writer.write_all(MAGIC)?;
        writer.write_all(&header.version.to_le_bytes())?;
        writer.write_all(&[header.table, header.generators])?;
        writer.write_all(&header.size_a.to_le_bytes())?;
        writer.write_all(&header.size_b.to_le_bytes())?;
        writer.write_all(&self.data)?;
        writer.flush()
    }

    /// Read a table written by [`PruningTable::write_to`], checking that it
    /// is a table of `kind` and that every entry is a possible distance.
    ///
    /// # Errors
    ///
    /// If the data can't be read, isn't a table, is a table of another kind,
    /// or has more or fewer entries or out of range distances.
    pub fn read_from(reader: &mut impl Read, kind: TableKind) -> Result<Self, TableLoadError> {
        let mut magic = [0; MAGIC.len()];
        read_exact(reader, &mut magic)?;
        if &magic != MAGIC {
            return Err(TableLoadError::BadMagic);
        }

        let mut version = [0; 2];
        let mut ids = [0; 2];
        let mut found_a = [0; 4];
        let mut found_b = [0; 4];
        read_exact(reader, &mut version)?;
        read_exact(reader, &mut ids)?;
        read_exact(reader, &mut found_a)?;
        read_exact(reader, &mut found_b)?;

        let found = TableHeader {
            version: u16::from_le_bytes(version),
            table: ids[0],
            generators: ids[1],
            size_a: u32::from_le_bytes(found_a),
            size_b: u32::from_le_bytes(found_b),
        };
        let expected = kind.header();
        if found != expected {
            return Err(TableLoadError::HeaderMismatch { expected, found });
        }

        let (size_a, size_b) = kind.sizes();
        let mut data = vec![0; size_a * size_b].into_boxed_slice();
        read_exact(reader, &mut data)?;
        if reader.read(&mut [0; 1])? != 0 {
            return Err(TableLoadError::TrailingData);
        }

        if data.first() != Some(&0) {
            return Err(TableLoadError::Corrupt(0));
        }
        let bound = kind.distance_bound();
        if let Some(index) = data.iter().position(|&d| d > bound) {
            return Err(TableLoadError::Corrupt(index));
        }
        let max_distance = data.iter().copied().max().unwrap_or(0);

        Ok(Self {
            data,
            kind,
            size_b,
            max_distance,
        })
    }
}

impl fmt::Debug for PruningTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PruningTable")
            .field("kind", &self.kind)
            .field("len", &self.data.len())
            .field("max_distance", &self.max_distance)
            .finish_non_exhaustive()
    }
}

fn columns(table: &MoveTable, generators: GeneratorSet) -> Vec<usize> {
    generators
        .moves()
        .iter()
        .map(|&move_| {
            table
                .generators()
                .column(move_)
                .unwrap_or_else(|| panic!("{move_} is missing from a move table"))
        })
        .collect()
}

fn read_exact(reader: &mut impl Read, buf: &mut [u8]) -> Result<(), TableLoadError> {
    reader.read_exact(buf).map_err(|e| match e.kind() {
        io::ErrorKind::UnexpectedEof => TableLoadError::Truncated,
        _ => TableLoadError::Io(e),
    })
}

#[cfg(test)]
mod tests {
    use std::{fs::File, io::BufWriter};

    use super::*;
    use crate::{
        coord::Phase1Coord,
        cube::CubieCube,
        moves::{Move, MoveSequence},
    };

    fn twist_slice(tables: &MoveTables, threads: usize) -> PruningTable {
        PruningTable::generate(TableKind::TwistSlice, tables, threads)
    }

    fn bytes_of(table: &PruningTable) -> Vec<u8> {
        let mut bytes = vec![];
        table.write_to(&mut bytes).unwrap();
        bytes
    }

    #[test_log::test]
    fn every_entry_is_reached() {
        let tables = MoveTables::generate();
        let table = twist_slice(&tables, 4);
        assert_eq!(table.len(), Twist::COUNT * Slice::COUNT);
        assert!(table.as_bytes().iter().all(|&d| d != UNVISITED));
        assert_eq!(table.distance(0, 0), 0);
        // Twist and slice together take at most 9 moves
        assert_eq!(table.max_distance(), 9);
        assert!(table.max_distance() <= TableKind::TwistSlice.distance_bound());
    }

    #[test_log::test]
    fn deterministic_across_thread_counts() {
        let tables = MoveTables::generate();
        let one = twist_slice(&tables, 1);
        let many = twist_slice(&tables, 7);
        assert_eq!(one.as_bytes(), many.as_bytes());
        assert_eq!(one, twist_slice(&tables, 1));
    }

    #[test]
    fn neighbours_differ_by_at_most_one() {
        let tables = MoveTables::generate();
        let table = PruningTable::generate(TableKind::FlipSlice, &tables, 2);
        for flip in (0..Flip::COUNT as u16).step_by(7) {
            for slice in (0..Slice::COUNT as u16).step_by(5) {
                let d = table.distance(flip, slice);
                for column in 0..Move::ALL.len() {
                    let next = table.distance(
                        tables.flip.apply(flip, column),
                        tables.slice.apply(slice, column),
                    );
                    assert!(d.abs_diff(next) <= 1);
                }
            }
        }
    }

    #[test]
    fn admissible_for_scrambles() {
        let tables = MoveTables::generate();
        let table = twist_slice(&tables, 2);
        for len in 0..12 {
            let scramble = MoveSequence::random(len);
            let coord = Phase1Coord::from_cube(&CubieCube::SOLVED.apply_sequence(scramble.moves()));
            assert!(table.distance(coord.twist, coord.slice) as usize <= len);
        }
    }

    #[test]
    fn phase2_table() {
        let tables = MoveTables::generate();
        let table = PruningTable::generate(TableKind::CornerSlice, &tables, 3);
        assert_eq!(table.len(), CornerPerm::COUNT * EdgePermSlice::COUNT);
        assert!(table.as_bytes().iter().all(|&d| d != UNVISITED));
        assert!(table.max_distance() <= TableKind::CornerSlice.distance_bound());

        // A single quarter turn of U is one phase 2 move away
        let cube = CubieCube::SOLVED.apply(Move::PHASE2[0]);
        assert_eq!(table.distance(cube.corner_perm(), cube.edge_perm_slice()), 1);
    }

    #[test]
    fn kinds_have_distinct_headers() {
        for (i, a) in TableKind::ALL.into_iter().enumerate() {
            for b in TableKind::ALL.into_iter().skip(i + 1) {
                assert_ne!(a.header(), b.header(), "{a} and {b}");
                assert_ne!(a.file_name(), b.file_name());
            }
        }
        // The two phase 2 tables differ only in which table they are
        assert_eq!(
            TableKind::CornerSlice.sizes(),
            TableKind::EdgeSlice.sizes()
        );
    }

    #[test]
    fn persistence_round_trip() {
        let tables = MoveTables::generate();
        let table = twist_slice(&tables, 2);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(TableKind::TwistSlice.file_name());
        table
            .write_to(&mut BufWriter::new(File::create(&path).unwrap()))
            .unwrap();

        let loaded =
            PruningTable::read_from(&mut File::open(&path).unwrap(), TableKind::TwistSlice)
                .unwrap();
        assert_eq!(loaded, table);
        assert_eq!(loaded.max_distance(), table.max_distance());
    }

    #[test]
    fn rejects_mismatched_header() {
        let tables = MoveTables::generate();
        let bytes = bytes_of(&twist_slice(&tables, 2));

        let wrong_kind = PruningTable::read_from(&mut bytes.as_slice(), TableKind::FlipSlice);
        assert!(matches!(wrong_kind, Err(TableLoadError::HeaderMismatch { .. })));

        let truncated =
            PruningTable::read_from(&mut &bytes[..bytes.len() - 1], TableKind::TwistSlice);
        assert!(matches!(truncated, Err(TableLoadError::Truncated)));

        let mut garbage = bytes.clone();
        garbage[0] = b'X';
        assert!(matches!(
            PruningTable::read_from(&mut garbage.as_slice(), TableKind::TwistSlice),
            Err(TableLoadError::BadMagic)
        ));
    }

    #[test]
    fn rejects_the_other_phase2_table() {
        let tables = MoveTables::generate();
        let bytes = bytes_of(&PruningTable::generate(TableKind::CornerSlice, &tables, 2));

        match PruningTable::read_from(&mut bytes.as_slice(), TableKind::EdgeSlice) {
            Err(TableLoadError::HeaderMismatch { expected, found }) => {
                assert_eq!(expected.table, TableKind::EdgeSlice.id());
                assert_eq!(found.table, TableKind::CornerSlice.id());
                assert_eq!((expected.size_a, expected.size_b), (found.size_a, found.size_b));
            }
            other => panic!("loaded a corner table as an edge table: {other:?}"),
        }
    }

    #[test]
    fn rejects_trailing_data() {
        let tables = MoveTables::generate();
        let mut bytes = bytes_of(&twist_slice(&tables, 2));
        bytes.push(0);
        assert!(matches!(
            PruningTable::read_from(&mut bytes.as_slice(), TableKind::TwistSlice),
            Err(TableLoadError::TrailingData)
        ));
    }

    #[test]
    fn rejects_impossible_distances() {
        let tables = MoveTables::generate();
        let table = twist_slice(&tables, 2);
        let bytes = bytes_of(&table);
        let header_len = bytes.len() - table.len();

        let mut too_far = bytes.clone();
        let last = too_far.len() - 1;
        too_far[last] = TableKind::TwistSlice.distance_bound() + 1;
        assert!(matches!(
            PruningTable::read_from(&mut too_far.as_slice(), TableKind::TwistSlice),
            Err(TableLoadError::Corrupt(index)) if index == table.len() - 1
        ));

        let mut unvisited = bytes.clone();
        unvisited[header_len + 100] = UNVISITED;
        assert!(matches!(
            PruningTable::read_from(&mut unvisited.as_slice(), TableKind::TwistSlice),
            Err(TableLoadError::Corrupt(100))
        ));

        let mut unsolved_origin = bytes;
        unsolved_origin[header_len] = 1;
        assert!(matches!(
            PruningTable::read_from(&mut unsolved_origin.as_slice(), TableKind::TwistSlice),
            Err(TableLoadError::Corrupt(0))
        ));
    }
}
