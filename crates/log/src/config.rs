//! Logging configuration
//!
//! A [`Config`] is read once when a logger is built. Every key is optional
//! when loading from TOML; missing keys take the values of
//! [`Config::default`]:
//!
//! ```toml
//! level = "info"
//! encode_as_json = true
//! file_logging_enabled = true
//! directory = "/var/log/app"
//! filename = "app"
//! max_size_mb = 64
//! ```

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use strata_logger::{Level, LevelEncoder, Sink};
use strata_logger_file::RotationPolicy;

/// Options for building a logger
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Minimum level written
    pub level: Level,
    /// Structured JSON output instead of delimited text
    pub encode_as_json: bool,
    /// Write rotating files in `directory`
    pub file_logging_enabled: bool,
    /// Write to the console; forced on when file logging is off or fails
    pub console_logging_enabled: bool,
    /// Record the call site of each record
    pub caller_enabled: bool,
    /// Reported in the configuration banner; call sites are always the
    /// caller of the logging method
    pub caller_skip: usize,
    /// Directory for log files
    pub directory: PathBuf,
    /// Base name for log files, see [`crate::log_file_name`]
    pub filename: String,
    /// Rotation size in megabytes; 0 selects the default of 100
    pub max_size_mb: u64,
    /// Rotated files to keep; 0 keeps all
    pub max_backups: usize,
    /// Days to keep rotated files; 0 keeps them forever
    pub max_age_days: u32,
    /// Gzip rotated files
    pub compress: bool,
    /// Make `dpanic` escalate
    pub development: bool,
    /// Column separator for text output; empty means a tab
    pub console_separator: String,
    /// Rendering of level names
    pub level_encoder: LevelEncoder,
    /// Replaces stdout for informational console output
    #[serde(skip)]
    pub console_info_stream: Option<Arc<dyn Sink>>,
    /// Replaces stderr for warning-and-above console output
    #[serde(skip)]
    pub console_error_stream: Option<Arc<dyn Sink>>,
}

impl Config {
    /// Preset for rotating JSON files named after the running program
    pub fn rotating() -> Self {
        Self {
            encode_as_json: true,
            console_separator: String::new(),
            directory: PathBuf::from("logs"),
            filename: program_name(),
            file_logging_enabled: true,
            max_size_mb: 128,
            max_backups: 10,
            max_age_days: 90,
            ..Self::default()
        }
    }

    /// Parse a TOML document
    pub fn from_toml_str(source: &str) -> Result<Self> {
        Ok(toml::from_str(source)?)
    }

    /// Read and parse a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&source)
    }

    /// Rotation policy for the log files
    pub fn rotation_policy(&self) -> RotationPolicy {
        RotationPolicy::from_megabytes(self.max_size_mb, self.max_age_days, self.max_backups)
            .with_compress(self.compress)
    }

    /// Set the informational console stream
    #[must_use]
    pub fn with_console_info_stream(mut self, sink: Arc<dyn Sink>) -> Self {
        self.console_info_stream = Some(sink);
        self
    }

    /// Set the warning-and-above console stream
    #[must_use]
    pub fn with_console_error_stream(mut self, sink: Arc<dyn Sink>) -> Self {
        self.console_error_stream = Some(sink);
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            level: Level::Debug,
            encode_as_json: false,
            file_logging_enabled: false,
            console_logging_enabled: false,
            caller_enabled: true,
            caller_skip: 1,
            directory: PathBuf::new(),
            filename: String::new(),
            max_size_mb: 0,
            max_backups: 0,
            max_age_days: 0,
            compress: false,
            development: false,
            console_separator: "|".to_string(),
            level_encoder: LevelEncoder::Lowercase,
            console_info_stream: None,
            console_error_stream: None,
        }
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("level", &self.level)
            .field("encode_as_json", &self.encode_as_json)
            .field("file_logging_enabled", &self.file_logging_enabled)
            .field("console_logging_enabled", &self.console_logging_enabled)
            .field("caller_enabled", &self.caller_enabled)
            .field("caller_skip", &self.caller_skip)
            .field("directory", &self.directory)
            .field("filename", &self.filename)
            .field("max_size_mb", &self.max_size_mb)
            .field("max_backups", &self.max_backups)
            .field("max_age_days", &self.max_age_days)
            .field("compress", &self.compress)
            .field("development", &self.development)
            .field("console_separator", &self.console_separator)
            .field("level_encoder", &self.level_encoder)
            .field("console_info_stream", &self.console_info_stream.is_some())
            .field("console_error_stream", &self.console_error_stream.is_some())
            .finish()
    }
}

fn program_name() -> String {
    std::env::args_os()
        .next()
        .as_deref()
        .and_then(|arg| Path::new(arg).file_name())
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}
