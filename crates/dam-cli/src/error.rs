//! CLI error type

use std::path::PathBuf;

use thiserror::Error;

use dam_section::KernelError;

/// Errors surfaced by the command-line host
#[derive(Debug, Error)]
pub enum CliError {
    /// A file could not be read or written
    #[error("{path}: {source}")]
    Io {
        /// File involved
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// The case file is not valid RON
    #[error("Failed to parse case file {path}: {source}")]
    Parse {
        /// Case file
        path: PathBuf,
        /// Parser error with position
        #[source]
        source: ron::error::SpannedError,
    },

    /// Results could not be serialized
    #[error("Failed to serialize results: {0}")]
    Serialize(String),

    /// The case's solid was rejected by the kernel
    #[error(transparent)]
    Kernel(#[from] KernelError),

    /// The case defines no section to analyze
    #[error("Case '{0}' defines no sections or stations")]
    NoSections(String),

    /// The worker pool could not be configured
    #[error("Failed to configure worker threads: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// Result type for CLI operations
pub type CliResult<T> = Result<T, CliError>;
