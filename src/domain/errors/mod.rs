// Domain errors - Error types for the domain layer

use std::path::Path;
use thiserror::Error;

/// Domain-specific error types
#[derive(Error, Debug)]
pub enum DomainError {
    /// Invalid arguments provided
    #[error("Bad arguments: {0}")]
    BadArgs(String),

    /// Configuration could not be loaded or is invalid
    #[error("Configuration error: {0}")]
    Config(String),

    /// External binary could not be started at all
    #[error("Failed to start {program}: {message}")]
    Spawn { program: String, message: String },

    /// Duration or keyframe probe failed
    #[error("Probe failed: {0}")]
    Probe(String),

    /// Encoder process failed or exited non-zero
    #[error("Transcode failed: {0}")]
    Transcode(String),

    /// Segment stream copy failed
    #[error("Segment extraction failed (exit code {code:?}): {detail}")]
    Extract { code: Option<i32>, detail: String },

    /// Concat demuxer run failed
    #[error("Concatenation failed (exit code {code:?}): {detail}")]
    Concat { code: Option<i32>, detail: String },

    /// Archive/move/mkdir/stat failure
    #[error("{context}: {source}")]
    FileSystem {
        context: String,
        #[source]
        source: std::io::Error,
    },

    /// No async runtime available to drive background work
    #[error("Runtime error: {0}")]
    Runtime(String),
}

impl DomainError {
    /// Wrap an I/O error with a description of the operation and the path involved
    pub fn fs(action: &str, path: &Path, source: std::io::Error) -> Self {
        DomainError::FileSystem {
            context: format!("Failed to {} {}", action, path.display()),
            source,
        }
    }
}

/// Result alias used across the crate
pub type DomainResult<T> = Result<T, DomainError>;
