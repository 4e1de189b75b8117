//! Bridge from the `log` crate to the registry's default logger

use crate::Registry;
use log::kv::{self, Source, VisitSource};
use log::{Log, Metadata, Record as LogRecord};
use std::sync::Arc;
use strata_logger::{Caller, Field, Level, Value};

/// Wrapper to implement the log crate's Log trait.
///
/// Each record is written by whatever logger the registry holds at that
/// moment, so reconfiguration takes effect for `log` users too.
pub struct LogBridge {
    registry: Arc<Registry>,
}

impl LogBridge {
    /// Create a new log bridge
    pub fn new(registry: Arc<Registry>) -> Self {
        Self { registry }
    }
}

impl Log for LogBridge {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        self.registry.logger().enabled(map_level(metadata.level()))
    }

    fn log(&self, record: &LogRecord<'_>) {
        let logger = self.registry.logger();
        let level = map_level(record.level());
        if !logger.enabled(level) {
            return;
        }

        let mut fields = vec![Field::new("target", record.target().to_string())];
        let _ = record.key_values().visit(&mut Collector(&mut fields));

        let caller = match (record.file_static(), record.line()) {
            (Some(file), Some(line)) => Some(Caller::new(file, line)),
            _ => None,
        };
        let _ = logger.log_located(level, caller, record.args().to_string(), fields);
    }

    fn flush(&self) {
        let _ = self.registry.logger().sync();
    }
}

struct Collector<'a>(&'a mut Vec<Field>);

impl<'kvs> VisitSource<'kvs> for Collector<'_> {
    fn visit_pair(&mut self, key: kv::Key<'kvs>, value: kv::Value<'kvs>) -> Result<(), kv::Error> {
        self.0.push(Field::new(key.as_str().to_string(), convert(&value)));
        Ok(())
    }
}

fn convert(value: &kv::Value<'_>) -> Value {
    if let Some(b) = value.to_bool() {
        Value::Bool(b)
    } else if let Some(i) = value.to_i64() {
        Value::I64(i)
    } else if let Some(u) = value.to_u64() {
        Value::U64(u)
    } else if let Some(f) = value.to_f64() {
        Value::F64(f)
    } else {
        Value::from(value.to_string())
    }
}

/// Map log levels to our levels
fn map_level(level: log::Level) -> Level {
    match level {
        log::Level::Error => Level::Error,
        log::Level::Warn => Level::Warn,
        log::Level::Info => Level::Info,
        log::Level::Debug | log::Level::Trace => Level::Debug,
    }
}

/// Route the log crate's macros to `registry`
///
/// The bridge is installed for the life of the process; the `log` crate's
/// own level filter is opened fully and filtering follows the registry.
///
/// # Example
/// ```no_run
/// use std::sync::Arc;
/// use strata_log::{Registry, compat::init_log_bridge};
///
/// let registry = Arc::new(Registry::new());
/// init_log_bridge(registry.clone()).expect("Failed to set log bridge");
/// ```
pub fn init_log_bridge(registry: Arc<Registry>) -> Result<(), log::SetLoggerError> {
    // log::set_logger requires 'static
    let bridge = Box::leak(Box::new(LogBridge::new(registry)));
    log::set_logger(bridge)?;
    log::set_max_level(log::LevelFilter::Trace);
    Ok(())
}
