//! The process-wide move and pruning tables.
//!
//! Tables are built once, either lazily by the first solve or explicitly with
//! [`init`], and are read-only afterwards. With a table directory configured,
//! pruning tables are loaded from disk when a compatible copy exists, and
//! written there after being built otherwise.

use std::{
    fs::{self, File},
    io::{self, BufReader, BufWriter},
    path::{Path, PathBuf},
    sync::OnceLock,
    time::Instant,
};

use log::{debug, info, warn};

use crate::{
    config::{SolverConfig, default_threads},
    coord::{MoveTables, Phase1Coord, Phase2Coord},
    pruning::{PruningTable, TableKind, TableLoadError},
    start, success,
};

static TABLES: OnceLock<Tables> = OnceLock::new();

/// How tables are built and where they are cached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableConfig {
    pub table_dir: Option<PathBuf>,
    pub threads: usize,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            table_dir: None,
            threads: default_threads(),
        }
    }
}

impl From<&SolverConfig> for TableConfig {
    fn from(config: &SolverConfig) -> Self {
        Self {
            table_dir: config.table_dir.clone(),
            threads: config.threads(),
        }
    }
}

pub struct Tables {
    pub moves: MoveTables,
    /// Phase 1: twist × slice
    pub twist_slice: PruningTable,
    /// Phase 1: flip × slice
    pub flip_slice: PruningTable,
    /// Phase 2: corner permutation × slice edge permutation
    pub corner_slice: PruningTable,
    /// Phase 2: non-slice edge permutation × slice edge permutation
    pub edge_slice: PruningTable,
}

/// The tables, building them with the default configuration if nothing has
/// yet.
pub fn global() -> &'static Tables {
    TABLES.get_or_init(|| Tables::load_or_generate(&TableConfig::default()))
}

/// Build the tables with `config`. Has no effect beyond returning the tables
/// if they already exist.
pub fn init(config: &TableConfig) -> &'static Tables {
    let mut initialized = false;
    let tables = TABLES.get_or_init(|| {
        initialized = true;
        Tables::load_or_generate(config)
    });
    if !initialized {
        debug!("Tables were already initialized; ignoring the new table configuration");
    }
    tables
}

impl Tables {
    /// Build every table in memory.
    #[must_use]
    pub fn generate(threads: usize) -> Self {
        Self::load_or_generate(&TableConfig {
            table_dir: None,
            threads,
        })
    }

    /// Build every table, reusing and refreshing cached pruning tables in
    /// `config.table_dir`.
    #[must_use]
    pub fn load_or_generate(config: &TableConfig) -> Self {
        info!(start!("Preparing tables"));
        let now = Instant::now();

        let moves = MoveTables::generate();

        if let Some(dir) = &config.table_dir {
            if let Err(e) = fs::create_dir_all(dir) {
                warn!("Could not create the table directory {}: {e}", dir.display());
            }
        }

        let prune = |kind| prepare(kind, &moves, config);
        let twist_slice = prune(TableKind::TwistSlice);
        let flip_slice = prune(TableKind::FlipSlice);
        let corner_slice = prune(TableKind::CornerSlice);
        let edge_slice = prune(TableKind::EdgeSlice);

        info!(success!("Tables ready in {:.3}s"), now.elapsed().as_secs_f64());

        Self {
            moves,
            twist_slice,
            flip_slice,
            corner_slice,
            edge_slice,
        }
    }

    #[must_use]
    pub fn pruning(&self, kind: TableKind) -> &PruningTable {
        match kind {
            TableKind::TwistSlice => &self.twist_slice,
            TableKind::FlipSlice => &self.flip_slice,
            TableKind::CornerSlice => &self.corner_slice,
            TableKind::EdgeSlice => &self.edge_slice,
        }
    }

    /// Lower bound on the phase 1 moves left from `coord`.
    #[inline]
    #[must_use]
    pub fn phase1_heuristic(&self, coord: Phase1Coord) -> u8 {
        self.twist_slice
            .distance(coord.twist, coord.slice)
            .max(self.flip_slice.distance(coord.flip, coord.slice))
    }

    /// Lower bound on the phase 2 moves left from `coord`.
    #[inline]
    #[must_use]
    pub fn phase2_heuristic(&self, coord: Phase2Coord) -> u8 {
        self.corner_slice
            .distance(coord.corner_perm, coord.edge_perm_slice)
            .max(
                self.edge_slice
                    .distance(coord.edge_perm_non_slice, coord.edge_perm_slice),
            )
    }
}

fn prepare(kind: TableKind, moves: &MoveTables, config: &TableConfig) -> PruningTable {
    let Some(dir) = &config.table_dir else {
        return PruningTable::generate(kind, moves, config.threads);
    };
    let path = dir.join(kind.file_name());

    match load(&path, kind) {
        Ok(table) => {
            info!("Loaded {} pruning table from {}", kind, path.display());
            return table;
        }
        Err(TableLoadError::Io(e)) if e.kind() == io::ErrorKind::NotFound => {
            debug!("No cached {} pruning table at {}", kind, path.display());
        }
        Err(e) => {
            warn!(
                "Discarding cached {} pruning table at {}: {e}",
                kind,
                path.display()
            );
        }
    }

    let table = PruningTable::generate(kind, moves, config.threads);
    if let Err(e) = save(&path, &table) {
        warn!(
            "Could not write {} pruning table to {}: {e}",
            kind,
            path.display()
        );
    }
    table
}

fn load(path: &Path, kind: TableKind) -> Result<PruningTable, TableLoadError> {
    let mut reader = BufReader::new(File::open(path)?);
    PruningTable::read_from(&mut reader, kind)
}

fn save(path: &Path, table: &PruningTable) -> io::Result<()> {
    // Write to a sibling and rename so that a crash never leaves a partial
    // table under the real name
    let partial = path.with_extension("partial");
    table.write_to(&mut BufWriter::new(File::create(&partial)?))?;
    fs::rename(&partial, path)
}
