//! ExtData CLI
//!
//! Command-line tools for ExtData data directories.
//!
//! # Commands
//!
//! - `inspect` - List stored records, backups and their versions
//! - `restore` - Copy an archived record back over its live path

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// ExtData command-line data directory tools.
#[derive(Parser)]
#[command(name = "extdata")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the data directory
    #[arg(global = true, short, long)]
    path: Option<PathBuf>,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List stored records with their versions
    Inspect {
        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Restore an archived record, e.g. `PlayersData/1001/econ`
    Restore {
        /// Storage path of the live record
        record: String,

        /// Overwrite the live record if it exists
        #[arg(short, long)]
        force: bool,
    },

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::Inspect { format } => {
            let path = cli.path.ok_or("Data directory required for inspect")?;
            commands::inspect::run(&path, &format)?;
        }
        Commands::Restore { record, force } => {
            let path = cli.path.ok_or("Data directory required for restore")?;
            commands::restore::run(&path, &record, force)?;
        }
        Commands::Version => {
            println!("ExtData CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("ExtData Core v{}", extdata_core::VERSION);
            println!("Extension v{}", extdata_core::EXTENSION_VERSION);
        }
    }

    Ok(())
}
