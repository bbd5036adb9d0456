//! Error type for the command line tool

use std::path::PathBuf;

use credtree_core::PipelineError;
use thiserror::Error;

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
    /// Input file could not be read
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Configuration file could not be parsed
    #[error("invalid config {}: {source}", path.display())]
    Config {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// No header row or no data rows
    #[error("{}: no data found (missing header row or data rows)", path.display())]
    NoData { path: PathBuf },

    /// None of the selected fields exist in the file
    #[error("{}: none of the selected fields have a matching column", path.display())]
    NoSelection { path: PathBuf },

    /// Row hashing failed
    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    /// Writing output failed
    #[error("output error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON output serialization failed
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CliError {
    /// Process exit code: 2 for unusable input, 1 for everything else
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::NoData { .. } | Self::NoSelection { .. } => 2,
            _ => 1,
        }
    }
}
