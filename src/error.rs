//! Errors surfaced by simulation runs.

use thiserror::Error;

use crate::config::ConfigError;

/// Errors that can stop a simulation from running or reporting.
///
/// Broken engine invariants are not represented here; they panic.
#[derive(Error, Debug)]
pub enum SimError {
    /// The parameters were rejected before the run started.
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// Writing the run trace failed.
    #[error("trace I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for simulation runs.
pub type SimResult<T> = Result<T, SimError>;
