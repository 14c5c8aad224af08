//! Error types for Marga

use thiserror::Error;

/// Rejected controller calls.
///
/// Search outcomes (no path, invalid goal) are never errors; they reach the
/// caller through the registered result callback.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerError {
    #[error("No result callback registered")]
    MissingCallback,

    #[error("No previous pathfinding request to retry")]
    NoPriorRequest,
}

/// Marga error type
#[derive(Error, Debug)]
pub enum MargaError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Controller error: {0}")]
    Controller(#[from] ControllerError),
}

impl From<toml::de::Error> for MargaError {
    fn from(e: toml::de::Error) -> Self {
        MargaError::Config(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, MargaError>;
