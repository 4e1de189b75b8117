//! The leveled logger and its two output channels
//!
//! Every call style funnels into one primitive that checks the channel's gate
//! before any message formatting or field conversion happens.

use crate::{
    Caller, DEFAULT_FIELD_NAME, Encoder, Escalation, Field, Fields, Level, LevelGate, Record, Sink,
    Value,
};
use chrono::Utc;
use std::borrow::Cow;
use std::fmt::{self, Write as _};
use std::sync::Arc;

/// Invoked after a fatal record has been written and flushed
pub type FatalHook = Arc<dyn Fn(&str) + Send + Sync>;

/// Message logged when an alternating key/value list ends with a bare key
pub const ODD_KEYS_MESSAGE: &str = "Ignored key without a value.";

/// Message logged when an alternating key/value list contains non-string keys
pub const NON_STRING_KEYS_MESSAGE: &str = "Ignored key-value pairs with non-string keys.";

/// A gate, an encoder and a sink serving one band of severities
#[derive(Clone)]
pub struct Channel {
    gate: Arc<LevelGate>,
    encoder: Arc<dyn Encoder>,
    sink: Arc<dyn Sink>,
    caller: bool,
}

impl Channel {
    /// Create a channel without caller reporting
    pub fn new(gate: Arc<LevelGate>, encoder: Arc<dyn Encoder>, sink: Arc<dyn Sink>) -> Self {
        Self {
            gate,
            encoder,
            sink,
            caller: false,
        }
    }

    /// Enable or disable caller reporting
    #[must_use]
    pub fn with_caller(mut self, caller: bool) -> Self {
        self.caller = caller;
        self
    }

    /// The gate this channel checks
    pub fn gate(&self) -> &Arc<LevelGate> {
        &self.gate
    }

    /// The sink this channel writes to
    pub fn sink(&self) -> &Arc<dyn Sink> {
        &self.sink
    }

    /// Whether records carry their call site
    pub fn reports_caller(&self) -> bool {
        self.caller
    }

    /// Check a level against the channel's gate
    #[inline(always)]
    pub fn enabled(&self, level: Level) -> bool {
        self.gate.enabled(level)
    }

    fn write(&self, record: &Record<'_>) -> std::io::Result<()> {
        self.sink.write(&self.encoder.encode(record))
    }
}

struct Shared {
    info: Channel,
    error: Channel,
    development: bool,
    fatal_hook: FatalHook,
    error_output: Arc<dyn Sink>,
}

impl Shared {
    #[inline(always)]
    fn channel(&self, level: Level) -> &Channel {
        if level.is_error_band() {
            &self.error
        } else {
            &self.info
        }
    }
}

/// Builder for [`Logger`]
pub struct LoggerBuilder {
    info: Channel,
    error: Channel,
    development: bool,
    fatal_hook: Option<FatalHook>,
    error_output: Option<Arc<dyn Sink>>,
}

impl LoggerBuilder {
    /// Make `dpanic` calls escalate
    #[must_use]
    pub fn development(mut self, development: bool) -> Self {
        self.development = development;
        self
    }

    /// Replace process termination on fatal calls
    #[must_use]
    pub fn fatal_hook(mut self, hook: impl Fn(&str) + Send + Sync + 'static) -> Self {
        self.fatal_hook = Some(Arc::new(hook));
        self
    }

    /// Where sink write failures are reported (stderr by default)
    #[must_use]
    pub fn error_output(mut self, sink: Arc<dyn Sink>) -> Self {
        self.error_output = Some(sink);
        self
    }

    /// Build the logger
    pub fn build(self) -> Logger {
        Logger {
            shared: Arc::new(Shared {
                info: self.info,
                error: self.error,
                development: self.development,
                fatal_hook: self
                    .fatal_hook
                    .unwrap_or_else(|| Arc::new(|_: &str| std::process::exit(1))),
                error_output: self
                    .error_output
                    .unwrap_or_else(|| Arc::new(crate::ConsoleSink::stderr())),
            }),
            fields: Arc::from(Vec::new()),
        }
    }
}

/// Leveled structured logger.
///
/// Debug and info records go to the info channel; everything from warn up
/// goes to the error channel. Cloning is cheap and clones share channels.
/// Child loggers created with the `with_*` methods extend the bound fields
/// and never modify the parent.
#[derive(Clone)]
pub struct Logger {
    shared: Arc<Shared>,
    fields: Arc<[Field]>,
}

/// Converts the primitive's outcome into each level's return type
trait Finish {
    fn finish(outcome: Result<(), Escalation>) -> Self;
}

impl Finish for () {
    #[inline(always)]
    fn finish(_: Result<(), Escalation>) {}
}

impl Finish for Result<(), Escalation> {
    #[inline(always)]
    fn finish(outcome: Result<(), Escalation>) -> Self {
        outcome
    }
}

impl Finish for Escalation {
    #[inline(always)]
    fn finish(outcome: Result<(), Escalation>) -> Self {
        match outcome {
            Err(escalation) => escalation,
            Ok(()) => Escalation::new(Level::Panic, String::new()),
        }
    }
}

macro_rules! leveled_methods {
    ($($name:ident => $level:expr, $ret:ty;)*) => {
        paste::paste! {
            $(
                #[doc = "Log a message at " $name " level"]
                #[track_caller]
                #[inline]
                pub fn $name<'m>(&self, message: impl Into<Cow<'m, str>>) -> $ret {
                    Finish::finish(self.emit($level, None, || message.into(), Vec::new))
                }

                #[doc = "Log a message with a field mapping at " $name " level"]
                #[track_caller]
                #[inline]
                pub fn [<$name _with>]<'m>(
                    &self,
                    message: impl Into<Cow<'m, str>>,
                    fields: Fields,
                ) -> $ret {
                    Finish::finish(
                        self.emit($level, None, || message.into(), || fields.into_list()),
                    )
                }

                #[doc = "Log a message with prepared fields at " $name " level"]
                #[track_caller]
                #[inline]
                pub fn [<$name v>]<'m>(
                    &self,
                    message: impl Into<Cow<'m, str>>,
                    fields: impl IntoIterator<Item = Field>,
                ) -> $ret {
                    Finish::finish(self.emit(
                        $level,
                        None,
                        || message.into(),
                        || fields.into_iter().collect(),
                    ))
                }

                #[doc = "Log a formatted message at " $name " level"]
                #[doc = ""]
                #[doc = "Formatting only happens when the level is enabled."]
                #[track_caller]
                #[inline]
                pub fn [<$name f>](&self, args: fmt::Arguments<'_>) -> $ret {
                    Finish::finish(self.emit($level, None, || format_message(args), Vec::new))
                }

                #[doc = "Log values joined by spaces at " $name " level"]
                #[track_caller]
                #[inline]
                pub fn [<$name ln>](&self, args: &[&dyn fmt::Display]) -> $ret {
                    Finish::finish(self.emit($level, None, || join_spaced(args), Vec::new))
                }

                #[doc = "Log a message with alternating keys and values at " $name " level"]
                #[track_caller]
                #[inline]
                pub fn [<$name w>]<'m>(
                    &self,
                    message: impl Into<Cow<'m, str>>,
                    keys_and_values: impl IntoIterator<Item = Value>,
                ) -> $ret {
                    let caller = Caller::here();
                    Finish::finish(self.emit(
                        $level,
                        Some(caller),
                        || message.into(),
                        || self.sweeten(caller, keys_and_values),
                    ))
                }
            )*
        }
    };
}

impl Logger {
    /// Start building a logger from its two channels
    pub fn builder(info: Channel, error: Channel) -> LoggerBuilder {
        LoggerBuilder {
            info,
            error,
            development: false,
            fatal_hook: None,
            error_output: None,
        }
    }

    /// Build a logger whose channels both use the given parts
    pub fn new(info: Channel, error: Channel) -> Self {
        Self::builder(info, error).build()
    }

    /// Check if a level would be written
    #[inline(always)]
    pub fn enabled(&self, level: Level) -> bool {
        self.shared.channel(level).enabled(level)
    }

    /// Channel serving debug and info
    pub fn info_channel(&self) -> &Channel {
        &self.shared.info
    }

    /// Channel serving warn and above
    pub fn error_channel(&self) -> &Channel {
        &self.shared.error
    }

    /// Whether `dpanic` escalates
    pub fn is_development(&self) -> bool {
        self.shared.development
    }

    /// Fields bound to this logger, in binding order
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Child logger with additional fields
    #[must_use]
    pub fn with_fields(&self, fields: Fields) -> Self {
        self.with_field_list(fields.into_list())
    }

    /// Child logger with one additional field
    #[must_use]
    pub fn with_field(&self, key: impl Into<Cow<'static, str>>, value: impl Into<Value>) -> Self {
        self.with_field_list([Field::new(key, value)])
    }

    /// Child logger with a value bound under the default key
    #[must_use]
    pub fn with(&self, value: impl Into<Value>) -> Self {
        self.with_field(DEFAULT_FIELD_NAME, value)
    }

    /// Child logger with prepared fields appended
    #[must_use]
    pub fn with_field_list(&self, fields: impl IntoIterator<Item = Field>) -> Self {
        Self {
            shared: self.shared.clone(),
            fields: self.fields.iter().cloned().chain(fields).collect(),
        }
    }

    /// Log at any level.
    ///
    /// Panic-tier levels return their [`Escalation`]; a fatal call terminates
    /// the process through the fatal hook.
    #[track_caller]
    pub fn log<'m>(
        &self,
        level: Level,
        message: impl Into<Cow<'m, str>>,
        fields: Vec<Field>,
    ) -> Result<(), Escalation> {
        self.emit(level, None, || message.into(), || fields)
    }

    /// Log at any level with an explicit call site
    pub fn log_located<'m>(
        &self,
        level: Level,
        caller: Option<Caller>,
        message: impl Into<Cow<'m, str>>,
        fields: Vec<Field>,
    ) -> Result<(), Escalation> {
        self.emit_with(level, caller, || message.into(), || fields)
    }

    /// Flush both channels
    pub fn sync(&self) -> std::io::Result<()> {
        let info = self.shared.info.sink.flush();
        let error = self.shared.error.sink.flush();
        info.and(error)
    }

    #[track_caller]
    #[inline(always)]
    fn emit<'m>(
        &self,
        level: Level,
        caller: Option<Caller>,
        message: impl FnOnce() -> Cow<'m, str>,
        fields: impl FnOnce() -> Vec<Field>,
    ) -> Result<(), Escalation> {
        let caller = match caller {
            Some(caller) => caller,
            None => Caller::here(),
        };
        self.emit_with(level, Some(caller), message, fields)
    }

    fn emit_with<'m>(
        &self,
        level: Level,
        caller: Option<Caller>,
        message: impl FnOnce() -> Cow<'m, str>,
        fields: impl FnOnce() -> Vec<Field>,
    ) -> Result<(), Escalation> {
        let channel = self.shared.channel(level);
        let enabled = channel.enabled(level);
        let escalates = level.escalates(self.shared.development);
        if !enabled && !escalates {
            return Ok(());
        }

        let message = message();
        if enabled {
            let mut record = Record::new(level, message.as_ref())
                .with_context(&self.fields)
                .with_fields(fields());
            if channel.caller {
                record.caller = caller;
            }
            if let Err(e) = channel.write(&record) {
                self.report_write_error(&e);
            }
        }

        match level {
            _ if !escalates => Ok(()),
            Level::Fatal => {
                let _ = self.sync();
                (self.shared.fatal_hook)(message.as_ref());
                Ok(())
            }
            _ => Err(Escalation::new(level, message.into_owned())),
        }
    }

    fn report_write_error(&self, err: &std::io::Error) {
        let line = format!(
            "{} write error: {err}\n",
            Utc::now().format(crate::encoder::TEXT_TIME_FORMAT)
        );
        let _ = self.shared.error_output.write(line.as_bytes());
    }

    /// Pair up an alternating key/value list, reporting malformed entries
    fn sweeten(
        &self,
        caller: Caller,
        keys_and_values: impl IntoIterator<Item = Value>,
    ) -> Vec<Field> {
        let mut fields = Vec::new();
        let mut invalid = Vec::new();
        let mut items = keys_and_values.into_iter().enumerate();

        while let Some((position, key)) = items.next() {
            let Some((_, value)) = items.next() else {
                let _ = self.log_located(
                    Level::Error,
                    Some(caller),
                    ODD_KEYS_MESSAGE,
                    vec![Field::new("ignored", key)],
                );
                break;
            };
            match key {
                Value::Str(key) => fields.push(Field { key, value }),
                key => invalid.push(Value::Map(vec![
                    ("position".to_string(), Value::from(position)),
                    ("key".to_string(), key),
                    ("value".to_string(), value),
                ])),
            }
        }

        if !invalid.is_empty() {
            let _ = self.log_located(
                Level::Error,
                Some(caller),
                NON_STRING_KEYS_MESSAGE,
                vec![Field::new("invalid", Value::Seq(invalid))],
            );
        }
        fields
    }

    leveled_methods! {
        debug => Level::Debug, ();
        info => Level::Info, ();
        warn => Level::Warn, ();
        error => Level::Error, ();
        dpanic => Level::DPanic, Result<(), Escalation>;
        panic => Level::Panic, Escalation;
        fatal => Level::Fatal, ();
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("info_level", &self.shared.info.gate.get())
            .field("error_level", &self.shared.error.gate.get())
            .field("development", &self.shared.development)
            .field("fields", &self.fields)
            .finish_non_exhaustive()
    }
}

fn format_message(args: fmt::Arguments<'_>) -> Cow<'static, str> {
    match args.as_str() {
        Some(s) => Cow::Borrowed(s),
        None => Cow::Owned(args.to_string()),
    }
}

fn join_spaced(args: &[&dyn fmt::Display]) -> Cow<'static, str> {
    let mut out = String::new();
    for (i, arg) in args.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        let _ = write!(out, "{arg}");
    }
    Cow::Owned(out)
}
