//! Configurable structured logging facade
//!
//! A [`Registry`] holds the default [`Logger`] and replaces it atomically when
//! reconfigured from a [`Config`]:
//! - console output to stdout/stderr, text or JSON
//! - rotating `<name>_info.log` and `<name>_error.log` files
//! - a shared level that can be changed at runtime
//! - loggers attached to and recovered from a [`Context`]
//!
//! With the `log-compat` and `tracing-compat` features, records from the
//! `log` and `tracing` ecosystems are forwarded to the registry's current
//! logger.

#![warn(missing_docs, unreachable_pub)]
#![forbid(unsafe_code)]

pub mod compat;
mod config;
mod error;
mod registry;

pub use config::Config;
pub use error::{Error, Result};
pub use registry::{CONFIGURED_MESSAGE, FILE_FAILURE_MESSAGE, Registry, log_file_name};

pub use strata_logger::{
    Context, Escalation, Field, Fields, Level, LevelEncoder, LevelGate, Logger, Sink, Value, field,
};
