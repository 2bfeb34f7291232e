//! Error types for the engine binary.
//!
//! [`AppError`] wraps every failure mode between reading the command line
//! and printing the completion message.

use cointoss_core::EngineError;
use cointoss_core::config::ConfigError;

/// Top-level error for the engine binary.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: ConfigError,
    },

    /// A command-line value was rejected.
    #[error("{source}")]
    InvalidArgument {
        /// The validation error.
        #[from]
        source: cointoss_core::GameError,
    },

    /// The simulation failed.
    #[error("simulation error: {source}")]
    Simulation {
        /// The underlying engine error.
        #[from]
        source: EngineError,
    },

    /// The blocking simulation task did not finish.
    #[error("simulation task failed: {message}")]
    Task {
        /// Description of the task failure.
        message: String,
    },

    /// Writing snapshots to stdout failed.
    #[error("output error: {source}")]
    Output {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },
}
