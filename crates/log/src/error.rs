//! Error types for the logging facade

use std::io;
use std::path::PathBuf;

/// Result type for facade operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while configuring logging
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A log file could not be set up
    #[error(transparent)]
    File(#[from] strata_logger_file::Error),

    /// The configuration could not be parsed
    #[error("failed to parse config: {0}")]
    Config(#[from] toml::de::Error),

    /// The configuration file could not be read
    #[error("failed to read config file {path}: {source}")]
    Io {
        /// The file being read
        path: PathBuf,
        /// The underlying error
        source: io::Error,
    },
}
