//! `equity` command-line entry point.

mod cli;
mod config;
mod error;
mod run;

use clap::Parser;
use std::process::ExitCode;

use crate::cli::{Cli, Command};
use crate::error::CliError;

#[tokio::main]
async fn main() -> ExitCode {
    match dispatch().await {
        Ok(code) => code,
        Err(error) => {
            eprintln!("error: {error}");
            ExitCode::from(error.exit_code())
        }
    }
}

async fn dispatch() -> Result<ExitCode, CliError> {
    let cli = Cli::parse();
    match &cli.command {
        Command::Run(args) => run::execute(args).await,
    }
}
