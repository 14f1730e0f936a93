use homeward_core::{ConfigError, StartError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum HostError {
    #[error("I/O operation failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cannot parse track line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Cannot start tracking: {0}")]
    Start(#[from] StartError),

    #[error("Invalid target '{0}', expected lat,lon[,name]")]
    InvalidTarget(String),

    #[error("Engine task is no longer running")]
    EngineGone,
}
