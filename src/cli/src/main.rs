use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};
use color_eyre::{
    eyre::{WrapErr, eyre},
    owo_colors::OwoColorize,
};
use env_logger::TimestampPrecision;
use itertools::Itertools;
use log::{LevelFilter, info};
use twophase::{
    CubieCube, MoveSequence, Solver, SolverConfig,
    config::default_table_dir,
    pruning::TableKind,
    tables::{self, TableConfig},
};

/// Solves the Rubik's Cube with Kociemba's two-phase algorithm
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Solver configuration file, in TOML format
    #[arg(long, short = 'c', value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Cache pruning tables in the platform cache directory unless the config
    /// names one
    #[arg(long)]
    cache: bool,

    /// Increase logging verbosity (can be repeated)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Solve a cube given by a scramble or by its facelets
    Solve {
        /// The 54 facelets in U, R, F, D, L, B face order
        #[arg(long, short, conflicts_with = "scramble")]
        facelets: Option<String>,
        /// Ceiling on the solution length, overriding the config
        #[arg(long, short = 'm')]
        max_length: Option<usize>,
        /// The scramble to undo, e.g. R U R' U'
        scramble: Vec<String>,
    },
    /// Print a random scramble, the facelets it produces, and a solution
    Scramble {
        /// Number of moves
        #[arg(long, short, default_value_t = 25)]
        length: usize,
    },
    /// Build the pruning tables, or load them from the cache, and describe them
    Tables,
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(match cli.verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        })
        .format_timestamp(Some(TimestampPrecision::Millis))
        .init();

    let mut config = match &cli.config {
        Some(path) => SolverConfig::load(path)
            .wrap_err_with(|| format!("Failed to load the config at {}", path.display()))?,
        None => SolverConfig::default(),
    };
    if cli.cache && config.table_dir.is_none() {
        config.table_dir = default_table_dir();
    }

    match cli.command {
        Commands::Solve {
            facelets,
            max_length,
            scramble,
        } => {
            let cube = match facelets {
                Some(facelets) => CubieCube::from_facelets(&facelets)?,
                None if scramble.is_empty() => {
                    return Err(eyre!("Give either a scramble or --facelets"));
                }
                None => CubieCube::from_scramble(&scramble.join(" "))?,
            };
            if let Some(max_length) = max_length {
                config.max_length = max_length;
            }

            let solver = Solver::from_config(&config);
            let solution = solver.solve(&cube)?;
            info!(
                "Phase 1: {} | Phase 2: {}",
                solution.phase1.iter().format(" ").yellow(),
                solution.phase2.iter().format(" ").green()
            );
            println!("{solution}");
            eprintln!("({} moves)", solution.len());
        }
        Commands::Scramble { length } => {
            let scramble = MoveSequence::random(length);
            let cube = CubieCube::SOLVED.apply_sequence(scramble.moves());
            println!("{scramble}");
            println!("{cube}");

            let solution = Solver::from_config(&config).solve(&cube)?;
            println!("{solution}");
            eprintln!("({} moves)", solution.len());
        }
        Commands::Tables => {
            let tables = tables::init(&TableConfig::from(&config));
            for kind in TableKind::ALL {
                let table = tables.pruning(kind);
                println!(
                    "{kind}: {} entries, max distance {} ({})",
                    table.len(),
                    table.max_distance(),
                    table.header()
                );
            }
            match &config.table_dir {
                Some(dir) => println!("Cached in {}", dir.display()),
                None => println!("Not cached"),
            }
        }
    }

    Ok(())
}
