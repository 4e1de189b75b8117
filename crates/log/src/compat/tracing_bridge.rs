//! Bridge from tracing to the registry's default logger

use crate::Registry;
use std::fmt;
use std::sync::Arc;
use strata_logger::{Caller, Field, Level, Value};
use tracing::field::{Field as TracingField, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::{Layer, layer::Context, registry::LookupSpan};

/// A tracing layer that forwards events as structured records.
///
/// Event fields become record fields; the names of the enclosing spans are
/// recorded under `span`, outermost first.
pub struct TracingBridge {
    registry: Arc<Registry>,
}

impl TracingBridge {
    /// Create a new tracing bridge
    pub fn new(registry: Arc<Registry>) -> Self {
        Self { registry }
    }
}

impl<S> Layer<S> for TracingBridge
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_event(&self, event: &Event<'_>, ctx: Context<'_, S>) {
        let level = match *event.metadata().level() {
            tracing::Level::ERROR => Level::Error,
            tracing::Level::WARN => Level::Warn,
            tracing::Level::INFO => Level::Info,
            tracing::Level::DEBUG | tracing::Level::TRACE => Level::Debug,
        };

        let logger = self.registry.logger();
        if !logger.enabled(level) {
            return;
        }

        let mut visitor = FieldVisitor::default();
        event.record(&mut visitor);

        if let Some(scope) = ctx.event_scope(event) {
            let spans: Vec<_> = scope.from_root().map(|span| span.name()).collect();
            visitor.fields.push(Field::new("span", spans.join("::")));
        }

        let metadata = event.metadata();
        let caller = match (metadata.file(), metadata.line()) {
            (Some(file), Some(line)) => Some(Caller::new(file, line)),
            _ => None,
        };
        let _ = logger.log_located(level, caller, visitor.message, visitor.fields);
    }
}

/// Visitor splitting the message from the structured fields
#[derive(Default)]
struct FieldVisitor {
    message: String,
    fields: Vec<Field>,
}

impl FieldVisitor {
    fn push(&mut self, field: &TracingField, value: impl Into<Value>) {
        self.fields.push(Field::new(field.name(), value));
    }
}

impl Visit for FieldVisitor {
    fn record_str(&mut self, field: &TracingField, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        } else {
            self.push(field, value.to_string());
        }
    }

    fn record_i64(&mut self, field: &TracingField, value: i64) {
        self.push(field, value);
    }

    fn record_u64(&mut self, field: &TracingField, value: u64) {
        self.push(field, value);
    }

    fn record_f64(&mut self, field: &TracingField, value: f64) {
        self.push(field, value);
    }

    fn record_bool(&mut self, field: &TracingField, value: bool) {
        self.push(field, value);
    }

    fn record_error(&mut self, field: &TracingField, value: &(dyn std::error::Error + 'static)) {
        self.push(field, value.to_string());
    }

    fn record_debug(&mut self, field: &TracingField, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{value:?}");
        } else {
            self.push(field, Value::debug(value));
        }
    }
}

/// Install a global subscriber forwarding all tracing events to `registry`
///
/// # Example
/// ```no_run
/// use std::sync::Arc;
/// use strata_log::{Registry, compat::init_tracing_bridge};
///
/// let registry = Arc::new(Registry::new());
/// init_tracing_bridge(registry).expect("Failed to set tracing bridge");
/// ```
pub fn init_tracing_bridge(
    registry: Arc<Registry>,
) -> Result<(), tracing::subscriber::SetGlobalDefaultError> {
    use tracing_subscriber::prelude::*;

    let subscriber = tracing_subscriber::registry().with(TracingBridge::new(registry));
    tracing::subscriber::set_global_default(subscriber)
}
