//! Error types for file-based logging

use std::io;
use std::path::PathBuf;

/// Result type for file sink operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur during file logging
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O error occurred
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Failed to create log directory
    #[error("failed to create log directory at {path}: {source}")]
    CreateDirectory {
        /// The path that failed to be created
        path: PathBuf,
        /// The underlying error
        source: io::Error,
    },

    /// Failed to rotate log file
    #[error("failed to rotate {path}: {source}")]
    Rotation {
        /// The active file being rotated
        path: PathBuf,
        /// The underlying error
        source: io::Error,
    },

    /// Failed to compress a rotated file
    #[error("failed to compress {path}: {source}")]
    Compression {
        /// The backup being compressed
        path: PathBuf,
        /// The underlying error
        source: io::Error,
    },
}

impl From<Error> for io::Error {
    fn from(err: Error) -> Self {
        match err {
            Error::Io(e) => e,
            other => io::Error::other(other),
        }
    }
}
