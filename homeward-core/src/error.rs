//! Error types for engine lifecycle and configuration

use thiserror::Error;

/// Reasons why [`TrackingEngine::start`](crate::TrackingEngine::start) refused to start
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartError {
    /// Location permission has not been granted by the host
    #[error("Location services are not authorized")]
    NotAuthorized,

    /// A tracking episode is already in progress
    #[error("Tracking is already running")]
    AlreadyRunning,

    /// The engine was torn down with a terminal stop
    #[error("Engine has been shut down and cannot be restarted")]
    Terminated,
}

impl StartError {
    /// Short hint the host can show to the user.
    ///
    /// Returns `None` when there is nothing the user needs to do.
    pub fn user_message(&self) -> Option<&'static str> {
        match self {
            StartError::NotAuthorized => Some("Please enable location services"),
            StartError::AlreadyRunning => None,
            StartError::Terminated => None,
        }
    }
}

/// Errors found while validating a [`TrackingConfig`](crate::TrackingConfig)
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// A buffer or counter that must hold at least one element is zero
    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },

    /// A distance or duration is negative or not a number
    #[error("{field} must be a non-negative number, got {value}")]
    Negative { field: &'static str, value: f64 },

    /// Proportional tolerance outside of (0, 1]
    #[error("relaxedEtaTolerance must be in (0, 1], got {0}")]
    InvalidTolerance(f64),

    /// Configuration document could not be parsed
    #[error("Invalid configuration: {0}")]
    Parse(String),
}

impl From<serde_json::Error> for ConfigError {
    fn from(e: serde_json::Error) -> Self {
        ConfigError::Parse(e.to_string())
    }
}
