//! Command-line arguments.
//!
//! ```bash
//! # Analyse a US listing with the default config
//! equity run --ticker aapl --input aapl.json
//!
//! # Bare tickers longer than four letters get the .NS suffix
//! equity run -t reliance -i reliance.json -o reliance-summary.json --config config.yaml
//! ```

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Equity metrics and moving-average crossover signals.
#[derive(Debug, Parser)]
#[command(name = "equity", author, version, about, propagate_version = true)]
pub(crate) struct Cli {
    #[command(subcommand)]
    pub(crate) command: Command,
}

#[derive(Debug, Subcommand)]
pub(crate) enum Command {
    /// Compute metrics and signals for one ticker and write a JSON summary.
    Run(RunArgs),
}

#[derive(Debug, Clone, Args)]
pub(crate) struct RunArgs {
    /// Ticker symbol, e.g. AAPL or RELIANCE.NS.
    #[arg(short, long)]
    pub(crate) ticker: String,

    /// JSON file with `prices` and optional `fundamentals` and `info`.
    #[arg(short, long)]
    pub(crate) input: PathBuf,

    /// Where to write the summary.
    #[arg(short, long, default_value = "output.json")]
    pub(crate) output: PathBuf,

    /// YAML configuration file.
    #[arg(short, long)]
    pub(crate) config: Option<PathBuf>,

    /// Skip writing to the database.
    #[arg(long)]
    pub(crate) no_store: bool,
}
