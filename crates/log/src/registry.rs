//! The process default logger and its configuration

use crate::{Config, Error, Result};
use arc_swap::ArcSwap;
use parking_lot::Mutex;
use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use strata_logger::{
    Caller, Channel, ConsoleSink, Context, Encoder, Escalation, Field, Fields, JsonEncoder, Level,
    LevelGate, Logger, MultiSink, Sink, TextEncoder, Value, field,
};
use strata_logger_file::{RotatingFileSink, RotationPolicy};

/// Message of the record announcing a new configuration
pub const CONFIGURED_MESSAGE: &str = "logging configured";

/// Message of the record reporting a log file that could not be set up
pub const FILE_FAILURE_MESSAGE: &str = "failed create log directory";

/// Name of the log file for one channel.
///
/// Every `.log` in `filename` is removed and `_info.log` or `_error.log`
/// appended; with no filename the result is `info.log` or `error.log`.
pub fn log_file_name(filename: &str, level: Level) -> String {
    let suffix = match level {
        Level::Error => "error.log",
        _ => "info.log",
    };
    if filename.is_empty() {
        suffix.to_string()
    } else {
        format!("{}_{suffix}", filename.replace(".log", ""))
    }
}

/// A logger together with the gate its channels share
struct Installed {
    logger: Logger,
    gate: Arc<LevelGate>,
}

/// Holds the default logger and swaps it atomically on reconfiguration.
///
/// A fresh registry logs text to the console at debug level. Readers always
/// see either the previous or the new logger in full, never a mix.
///
/// Every logger the registry builds writes a given log file through the same
/// [`RotatingFileSink`], so handles kept from before a reconfiguration and
/// the new default rotate that file under one lock.
pub struct Registry {
    current: ArcSwap<Installed>,
    files: FileSinks,
}

impl Registry {
    /// Create a registry with the console default installed
    pub fn new() -> Self {
        let files = FileSinks::default();
        let (installed, _) = build(&mut Config::default(), &files);
        Self {
            current: ArcSwap::from_pointee(installed),
            files,
        }
    }

    /// Replace the default logger.
    ///
    /// A working logger is always installed. If a log file cannot be set up,
    /// console output is forced on, the failure is logged through the new
    /// logger, and the first error is returned.
    #[track_caller]
    pub fn configure(&self, mut config: Config) -> Result<()> {
        let caller = Caller::here();
        let (installed, failures) = build(&mut config, &self.files);
        let logger = installed.logger.clone();
        self.current.store(Arc::new(installed));

        announce(&logger, &config, &failures, caller);
        first_failure(failures)
    }

    /// Build a standalone logger without touching the default.
    ///
    /// The logger has its own gate, so [`Registry::set_level`] does not
    /// affect it.
    #[track_caller]
    pub fn new_logger(&self, mut config: Config) -> Result<Logger> {
        let caller = Caller::here();
        let (installed, failures) = build(&mut config, &self.files);

        announce(&installed.logger, &config, &failures, caller);
        first_failure(failures).map(|()| installed.logger)
    }

    /// The current default logger
    pub fn logger(&self) -> Logger {
        self.current.load().logger.clone()
    }

    /// The default logger's minimum level
    pub fn level(&self) -> Level {
        self.current.load().gate.get()
    }

    /// Change the default logger's minimum level
    pub fn set_level(&self, level: Level) {
        self.current.load().gate.set(level);
    }

    /// The gate shared by the default logger's channels
    pub fn gate(&self) -> Arc<LevelGate> {
        self.current.load().gate.clone()
    }

    /// Child of the default logger with one field
    pub fn with_field(
        &self,
        key: impl Into<Cow<'static, str>>,
        value: impl Into<Value>,
    ) -> Logger {
        self.logger().with_field(key, value)
    }

    /// Child of the default logger with several fields
    pub fn with_fields(&self, fields: Fields) -> Logger {
        self.logger().with_fields(fields)
    }

    /// Child of the default logger with a value under the default key
    pub fn with(&self, value: impl Into<Value>) -> Logger {
        self.logger().with(value)
    }

    /// Log through the default logger at a level chosen at runtime
    #[track_caller]
    pub fn at_level<'m>(
        &self,
        level: Level,
        message: impl Into<Cow<'m, str>>,
        fields: Vec<Field>,
    ) -> std::result::Result<(), Escalation> {
        self.logger().log(level, message, fields)
    }

    /// Derive a context carrying the current default logger
    pub fn context_with_logger(&self, ctx: &Context) -> Context {
        ctx.with_logger(self.logger())
    }

    /// The logger attached to `ctx`, or the current default
    pub fn from_context(&self, ctx: &Context) -> Logger {
        ctx.logger().cloned().unwrap_or_else(|| self.logger())
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("logger", &self.current.load().logger)
            .finish()
    }
}

/// Open rotating sinks by path
#[derive(Default)]
struct FileSinks {
    open: Mutex<HashMap<PathBuf, Arc<RotatingFileSink>>>,
}

impl FileSinks {
    /// The sink for `path`, reusing an open one under the new policy.
    ///
    /// Sinks no logger holds any more are closed first.
    fn get(
        &self,
        path: &Path,
        policy: RotationPolicy,
    ) -> strata_logger_file::Result<Arc<RotatingFileSink>> {
        let mut open = self.open.lock();
        open.retain(|_, sink| Arc::strong_count(sink) > 1);
        if let Some(sink) = open.get(path) {
            sink.set_policy(policy);
            return Ok(sink.clone());
        }
        let sink = Arc::new(RotatingFileSink::open(path, policy)?);
        open.insert(path.to_path_buf(), sink.clone());
        Ok(sink)
    }
}

/// A log file that could not be opened
struct Failure {
    error: Error,
    path: String,
}

/// Build a logger from `config`, recording the console fallback in it
fn build(config: &mut Config, files: &FileSinks) -> (Installed, Vec<Failure>) {
    let gate = Arc::new(LevelGate::new(config.level));
    let encoder: Arc<dyn Encoder> = if config.encode_as_json {
        Arc::new(JsonEncoder::new().with_level_encoder(config.level_encoder))
    } else {
        Arc::new(
            TextEncoder::new()
                .with_separator(config.console_separator.as_str())
                .with_level_encoder(config.level_encoder),
        )
    };

    let mut info = MultiSink::default();
    let mut error = MultiSink::default();
    let mut failures = Vec::new();

    if config.file_logging_enabled {
        let policy = config.rotation_policy();
        for (level, sinks) in [(Level::Info, &mut info), (Level::Error, &mut error)] {
            let path = config.directory.join(log_file_name(&config.filename, level));
            match files.get(&path, policy) {
                Ok(sink) => sinks.push(sink),
                Err(e) => failures.push(Failure {
                    error: e.into(),
                    path: config.directory.display().to_string(),
                }),
            }
        }
    }

    if !config.file_logging_enabled || !failures.is_empty() {
        config.console_logging_enabled = true;
    }
    if config.console_logging_enabled {
        info.push(
            config
                .console_info_stream
                .clone()
                .unwrap_or_else(|| Arc::new(ConsoleSink::stdout())),
        );
        error.push(
            config
                .console_error_stream
                .clone()
                .unwrap_or_else(|| Arc::new(ConsoleSink::stderr())),
        );
    }

    let channel = |sink: MultiSink| {
        let sink: Arc<dyn Sink> = Arc::new(sink);
        Channel::new(gate.clone(), encoder.clone(), sink).with_caller(config.caller_enabled)
    };
    let logger = Logger::builder(channel(info), channel(error))
        .development(config.development)
        .build();

    (Installed { logger, gate }, failures)
}

/// Report setup failures, then announce the configuration on both channels
fn announce(logger: &Logger, config: &Config, failures: &[Failure], caller: Caller) {
    for failure in failures {
        let _ = logger.log_located(
            Level::Error,
            Some(caller),
            FILE_FAILURE_MESSAGE,
            vec![
                field("error", failure.error.to_string()),
                field("path", failure.path.clone()),
            ],
        );
    }

    let fields = vec![
        field("fileLogging", config.file_logging_enabled),
        field("consoleLogging", config.console_logging_enabled),
        field("caller", config.caller_enabled),
        field("callerSkip", config.caller_skip),
        field("jsonLogOutput", config.encode_as_json),
        field("logDirectory", config.directory.display().to_string()),
        field("maxSizeMB", config.max_size_mb),
        field("maxBackups", config.max_backups),
        field("maxAgeInDays", config.max_age_days),
    ];
    let _ = logger.log_located(Level::Info, Some(caller), CONFIGURED_MESSAGE, fields.clone());
    let _ = logger.log_located(Level::Error, Some(caller), CONFIGURED_MESSAGE, fields);
}

fn first_failure(failures: Vec<Failure>) -> Result<()> {
    match failures.into_iter().next() {
        Some(failure) => Err(failure.error),
        None => Ok(()),
    }
}
