use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading the run configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Settings file does not exist.
    #[error("Settings file not found: {0}")]
    NotFound(PathBuf),
    /// Settings file is not valid relaxed JSON, or has fields of the wrong type.
    #[error("Invalid settings in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    /// Generic I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
