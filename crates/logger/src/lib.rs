//! Leveled structured logging core
//!
//! This crate provides the building blocks of the strata logging facade:
//! - [`Level`] and the atomic [`LevelGate`] every record is checked against
//! - [`Field`]/[`Value`] structured data and the [`Fields`] mapping
//! - [`JsonEncoder`] and [`TextEncoder`] record encoders
//! - [`Sink`] destinations: console, any writer, memory, fan-out
//! - [`Logger`] with seven severities, six call styles each, and child loggers
//!
//! File rotation lives in `strata-logger-file`; process-wide configuration in
//! `strata-log`.

#![warn(missing_docs, unreachable_pub)]
#![forbid(unsafe_code)]

mod console;
mod context;
mod encoder;
mod error;
mod field;
mod level;
mod logger;
mod macros;
mod record;
mod sink;

pub use console::{ConsoleSink, ConsoleStream};
pub use context::Context;
pub use encoder::{
    CALLER_KEY, Encoder, JSON_TIME_FORMAT, JsonEncoder, LEVEL_KEY, LevelEncoder, MESSAGE_KEY,
    TEXT_TIME_FORMAT, TIME_KEY, TextEncoder,
};
pub use error::Escalation;
pub use field::{DEFAULT_FIELD_NAME, Field, Fields, Value, field};
pub use level::{Level, LevelGate, ParseLevelError};
pub use logger::{
    Channel, FatalHook, Logger, LoggerBuilder, NON_STRING_KEYS_MESSAGE, ODD_KEYS_MESSAGE,
};
pub use record::{Caller, Record};
pub use sink::{MemorySink, MultiSink, Sink, WriterSink};
