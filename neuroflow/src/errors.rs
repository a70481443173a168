//! Error types for neuroflow pipelines.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for pipeline operations.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// An unrecoverable condition that has already been logged at FATAL.
    ///
    /// Only [`Logger::fatal`](crate::logging::Logger::fatal) constructs this
    /// variant, so by the time a caller sees it every sink has the message.
    #[error("fatal: {0}")]
    Fatal(String),

    /// A log file for this run already exists and overwrite is off.
    #[error("Log file '{}' already exists", .0.display())]
    LogFileExists(PathBuf),

    /// An external command could not be started.
    #[error("Failed to spawn '{command}': {source}")]
    Spawn {
        /// The command line that failed to start.
        command: String,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// A pipeline definition is invalid.
    #[error("Invalid pipeline: {0}")]
    Validation(String),

    /// A pipeline manifest could not be read.
    #[error("Invalid manifest: {0}")]
    Manifest(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PipelineError {
    /// Creates a spawn error.
    #[must_use]
    pub fn spawn(command: impl Into<String>, source: std::io::Error) -> Self {
        Self::Spawn {
            command: command.into(),
            source,
        }
    }

    /// Returns true if the error was raised through the fatal path.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Fatal(_))
    }

    /// The process exit status to use when this error ends a run.
    #[must_use]
    pub fn exit_status(&self) -> u8 {
        match self {
            Self::Fatal(_) => 1,
            Self::LogFileExists(_) | Self::Validation(_) | Self::Manifest(_) => 2,
            Self::Spawn { .. } | Self::Io(_) => 3,
        }
    }
}

/// Result alias used across the crate.
pub type Result<T, E = PipelineError> = std::result::Result<T, E>;
