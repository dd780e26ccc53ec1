use std::path::PathBuf;

use thiserror::Error;

/// CLI-level error categories mapped to exit codes.
#[derive(Debug, Error)]
pub(crate) enum CliError {
    #[error("invalid config {path}: {message}")]
    Config { path: PathBuf, message: String },

    #[error("cannot read input {path}: {source}")]
    Input {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Metrics(#[from] equity::MetricsError),

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    pub(crate) const fn exit_code(&self) -> u8 {
        match self {
            Self::Config { .. } => 2,
            Self::Metrics(_) => 3,
            Self::Serialization(_) => 4,
            Self::Input { .. } | Self::Io(_) => 10,
        }
    }
}
