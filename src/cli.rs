use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "tapatite",
    about = "Apatite saturation along MELTS cooling paths, one composition per worker.",
    version,
    author,
    args_conflicts_with_subcommands = true
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Comma-separated compositions, 18 fields per row
    pub input: Option<PathBuf>,

    /// Parallel simulation workers
    #[arg(long, default_value_t = crate::config::DEFAULT_WORKERS)]
    pub workers: usize,

    /// TOML file with simulation settings
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Write result rows here instead of stdout
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Root for per-worker scratch directories
    #[arg(long)]
    pub scratch: Option<PathBuf>,

    /// Stop the saturation scan below this percentage of melt
    #[arg(long)]
    pub min_melt: Option<f64>,

    /// No banner, progress bar or summary
    #[arg(long, short)]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Bulk-composition figures only, no simulation
    Bulk {
        /// Comma-separated compositions, 18 fields per row
        input: PathBuf,
    },
}
