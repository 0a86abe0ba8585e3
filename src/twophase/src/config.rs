//! Solver configuration, loadable from TOML.

use std::{fs, io, path::{Path, PathBuf}, thread::available_parallelism};

use log::warn;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default ceiling on the combined solution length.
pub const DEFAULT_MAX_LENGTH: usize = 23;
pub const DEFAULT_PHASE1_MAX_DEPTH: usize = 12;
pub const DEFAULT_PHASE2_MAX_DEPTH: usize = 18;

/// Global solver configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SolverConfig {
    pub max_length: usize,
    pub phase1_max_depth: usize,
    pub phase2_max_depth: usize,
    /// Where pruning tables are cached between runs. Tables are rebuilt every
    /// run when unset.
    pub table_dir: Option<PathBuf>,
    /// Worker threads for table generation, all cores when unset.
    pub threads: Option<usize>,
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Could not read the config file: {0}")]
    Io(#[from] io::Error),
    #[error("Invalid config: {0}")]
    Toml(#[from] toml::de::Error),
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            max_length: DEFAULT_MAX_LENGTH,
            phase1_max_depth: DEFAULT_PHASE1_MAX_DEPTH,
            phase2_max_depth: DEFAULT_PHASE2_MAX_DEPTH,
            table_dir: None,
            threads: None,
        }
    }
}

impl SolverConfig {
    /// # Errors
    ///
    /// If the string is not valid TOML or has unknown or mistyped keys.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    /// # Errors
    ///
    /// If the file can't be read or doesn't parse.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        Self::from_toml_str(&fs::read_to_string(path)?)
    }

    /// The configured thread count, or the available parallelism.
    #[must_use]
    pub fn threads(&self) -> usize {
        self.threads.unwrap_or_else(default_threads)
    }
}

#[must_use]
pub fn default_threads() -> usize {
    match available_parallelism() {
        Ok(v) => v.get(),
        Err(e) => {
            warn!(
                "{} {e}",
                "Failed to get available parallelism; defaulting to 1:"
            );
            1
        }
    }
}

/// The platform cache directory for pruning tables.
#[must_use]
pub fn default_table_dir() -> Option<PathBuf> {
    dirs::cache_dir().map(|cache| cache.join("twophase-tables"))
}
