//! The `run` command.

use std::path::Path;
use std::process::ExitCode;

use equity::{MetricsError, MetricsRunner, RawInput, SqliteStore, Symbol};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use crate::cli::RunArgs;
use crate::config::load_config;
use crate::error::CliError;

pub(crate) async fn execute(args: &RunArgs) -> Result<ExitCode, CliError> {
    let symbol = Symbol::normalized(args.ticker.as_str());
    let config = load_config(args.config.as_deref())?;
    init_logging(&config.logging.level);
    debug!(
        symbol = %symbol,
        period = %config.data_settings.historical_period,
        min_sma_days = config.data_settings.min_trading_days_for_sma,
        "Loaded configuration"
    );

    let raw = read_input(&args.input)?;

    let runner = MetricsRunner::new().with_windows(config.indicators);
    let mut report = match runner.run(&symbol, &raw).await {
        Ok(report) => report,
        Err(MetricsError::EmptyInput(_)) => {
            println!("No price data for {symbol}, exiting.");
            return Ok(ExitCode::SUCCESS);
        }
        Err(e) => return Err(e.into()),
    };

    // Only opened once there is something to write.
    if !args.no_store {
        let store = SqliteStore::new(&config.database.path)?;
        info!(path = %config.database.path.display(), "Opened metrics database");
        report.persist_to(&store).await;
    }

    if !report.rejections.is_empty() {
        warn!(
            symbol = %symbol,
            rejected = report.rejections.len(),
            "Some price rows were dropped"
        );
    }

    let json = serde_json::to_string_pretty(&report.summary)?;
    std::fs::write(&args.output, json)?;
    println!("Saved analysis to {}", args.output.display());

    Ok(ExitCode::SUCCESS)
}

fn read_input(path: &Path) -> Result<RawInput, CliError> {
    let content = std::fs::read_to_string(path).map_err(|source| CliError::Input {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(serde_json::from_str(&content)?)
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.to_ascii_lowercase()));
    // A subscriber may already be installed when run from tests.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
