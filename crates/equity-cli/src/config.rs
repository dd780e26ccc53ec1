//! YAML configuration.
//!
//! Every section and key is optional:
//!
//! ```yaml
//! database:
//!   path: financial_data.db
//! logging:
//!   level: INFO
//! data_settings:
//!   historical_period: 5y
//!   min_trading_days_for_sma: 200
//! indicators:
//!   short_window: 50
//!   long_window: 200
//!   trailing_high_window: 252
//! ```

use std::path::{Path, PathBuf};

use equity::IndicatorWindows;
use serde::{Deserialize, Serialize};

use crate::error::CliError;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct AppConfig {
    pub(crate) database: DatabaseConfig,
    pub(crate) logging: LoggingConfig,
    pub(crate) data_settings: DataSettings,
    pub(crate) indicators: IndicatorWindows,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct DatabaseConfig {
    pub(crate) path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("financial_data.db"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct LoggingConfig {
    /// Default filter level; `RUST_LOG` takes precedence.
    pub(crate) level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "INFO".to_string(),
        }
    }
}

/// Settings for the upstream price download. Recorded in the log only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct DataSettings {
    pub(crate) historical_period: String,
    pub(crate) min_trading_days_for_sma: usize,
}

impl Default for DataSettings {
    fn default() -> Self {
        Self {
            historical_period: "5y".to_string(),
            min_trading_days_for_sma: 200,
        }
    }
}

/// Loads the config file, falling back to defaults when no path is given
/// or the file does not exist.
pub(crate) fn load_config(path: Option<&Path>) -> Result<AppConfig, CliError> {
    let Some(path) = path.filter(|p| p.exists()) else {
        return Ok(AppConfig::default());
    };

    let content = std::fs::read_to_string(path).map_err(|e| CliError::Config {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    if content.trim().is_empty() {
        return Ok(AppConfig::default());
    }

    let config: AppConfig = serde_yaml::from_str(&content).map_err(|e| CliError::Config {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    config
        .indicators
        .validate()
        .map_err(|e| CliError::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
    Ok(config)
}
