use std::path::PathBuf;

use thiserror::Error;

/// Gait analysis error types
#[derive(Error, Debug)]
pub enum GaitError {
    #[error("Record not found: {}", path.display())]
    RecordNotFound { path: PathBuf },

    #[error("Malformed record: {0}")]
    RecordFormat(String),

    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Configuration file error: {0}")]
    Config(String),

    #[error("Numerical instability: {0}")]
    NumericalInstability(String),
}

impl GaitError {
    /// Map an I/O failure on `path`, keeping "not found" distinct from other read errors
    pub fn from_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        if source.kind() == std::io::ErrorKind::NotFound {
            GaitError::RecordNotFound { path }
        } else {
            GaitError::Io { path, source }
        }
    }
}

/// Result type for gait analysis operations
pub type Result<T> = std::result::Result<T, GaitError>;
