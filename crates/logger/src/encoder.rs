//! Record encoders
//!
//! Two styles are provided: [`JsonEncoder`] for machine-readable output and
//! [`TextEncoder`] for delimited human-readable lines. Both render times and
//! durations in fixed formats so identical records always encode to
//! identical bytes:
//!
//! - times: UTC, millisecond precision (`2006-01-02T15:04:05.000` for JSON,
//!   `2006-01-02 15:04:05.000` for text)
//! - durations: integer nanoseconds
//!
//! Encoding never fails. Non-finite floats become the strings `NaN`, `+Inf`
//! and `-Inf`.

use crate::{Field, Level, Record, Value};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Write as _};

/// JSON timestamp format
pub const JSON_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f";

/// Text timestamp format
pub const TEXT_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// Key of the level entry in structured output
pub const LEVEL_KEY: &str = "lvl";
/// Key of the timestamp entry in structured output
pub const TIME_KEY: &str = "@t";
/// Key of the call-site entry in structured output
pub const CALLER_KEY: &str = "caller";
/// Key of the message entry in structured output
pub const MESSAGE_KEY: &str = "msg";

/// Formats a record into bytes
pub trait Encoder: Send + Sync + 'static {
    /// Encode a record, including the trailing newline
    fn encode(&self, record: &Record<'_>) -> Vec<u8>;
}

/// Rendering of level names
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LevelEncoder {
    /// `info`, `warn`, ...
    #[default]
    Lowercase,
    /// `INFO`, `WARN`, ...
    Capital,
    /// Caller-supplied mapping
    #[serde(skip)]
    Custom(fn(Level) -> &'static str),
}

impl LevelEncoder {
    /// Render a level name
    pub fn render(&self, level: Level) -> &'static str {
        match self {
            Self::Lowercase => level.as_str(),
            Self::Capital => level.as_capital_str(),
            Self::Custom(f) => f(level),
        }
    }
}

/// Machine-readable encoder: one JSON object per line
#[derive(Debug, Clone, Default)]
pub struct JsonEncoder {
    level_encoder: LevelEncoder,
}

impl JsonEncoder {
    /// Create a JSON encoder with lowercase level names
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the level rendering
    #[must_use]
    pub fn with_level_encoder(mut self, level_encoder: LevelEncoder) -> Self {
        self.level_encoder = level_encoder;
        self
    }
}

impl Encoder for JsonEncoder {
    fn encode(&self, record: &Record<'_>) -> Vec<u8> {
        let mut out = String::with_capacity(128);
        out.push('{');
        write_json_key(&mut out, LEVEL_KEY);
        write_json_str(&mut out, self.level_encoder.render(record.level));
        out.push(',');
        write_json_key(&mut out, TIME_KEY);
        write_json_time(&mut out, &record.timestamp, JSON_TIME_FORMAT);
        if let Some(caller) = &record.caller {
            out.push(',');
            write_json_key(&mut out, CALLER_KEY);
            write_json_str(&mut out, &caller.to_string());
        }
        out.push(',');
        write_json_key(&mut out, MESSAGE_KEY);
        write_json_str(&mut out, &record.message);
        for field in record.all_fields() {
            out.push(',');
            write_json_key(&mut out, &field.key);
            write_json_value(&mut out, &field.value, JSON_TIME_FORMAT);
        }
        out.push_str("}\n");
        out.into_bytes()
    }
}

/// Human-readable encoder: delimited columns followed by `key=value` pairs
#[derive(Debug, Clone)]
pub struct TextEncoder {
    separator: String,
    level_encoder: LevelEncoder,
}

impl TextEncoder {
    /// Default column separator
    pub const DEFAULT_SEPARATOR: &'static str = "|";

    /// Create a text encoder with the default separator
    pub fn new() -> Self {
        Self {
            separator: Self::DEFAULT_SEPARATOR.to_string(),
            level_encoder: LevelEncoder::default(),
        }
    }

    /// Set the column separator. An empty separator means a tab.
    #[must_use]
    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        let separator = separator.into();
        self.separator = if separator.is_empty() {
            "\t".to_string()
        } else {
            separator
        };
        self
    }

    /// Set the level rendering
    #[must_use]
    pub fn with_level_encoder(mut self, level_encoder: LevelEncoder) -> Self {
        self.level_encoder = level_encoder;
        self
    }

    /// Column separator in use
    pub fn separator(&self) -> &str {
        &self.separator
    }
}

impl Default for TextEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Encoder for TextEncoder {
    fn encode(&self, record: &Record<'_>) -> Vec<u8> {
        let sep = self.separator.as_str();
        let mut out = String::with_capacity(128);
        let _ = write!(out, "{}", record.timestamp.format(TEXT_TIME_FORMAT));
        out.push_str(sep);
        out.push_str(self.level_encoder.render(record.level));
        if let Some(caller) = &record.caller {
            out.push_str(sep);
            let _ = write!(out, "{caller}");
        }
        out.push_str(sep);
        out.push_str(&record.message);
        for Field { key, value } in record.all_fields() {
            out.push_str(sep);
            out.push_str(key);
            out.push('=');
            write_text_value(&mut out, value);
        }
        out.push('\n');
        out.into_bytes()
    }
}

fn write_text_value(out: &mut String, value: &Value) {
    match value {
        Value::Null => out.push_str("null"),
        Value::Str(s) => out.push_str(s),
        Value::Opaque(s) => out.push_str(s),
        Value::I64(i) => {
            let _ = write!(out, "{i}");
        }
        Value::U64(u) => {
            let _ = write!(out, "{u}");
        }
        Value::F64(f) => write_float(out, *f),
        Value::Bool(b) => {
            let _ = write!(out, "{b}");
        }
        Value::Time(t) => {
            let _ = write!(out, "{}", t.format(TEXT_TIME_FORMAT));
        }
        Value::Duration(d) => {
            let _ = write!(out, "{}", d.as_nanos());
        }
        Value::Map(_) | Value::Seq(_) => write_json_value(out, value, TEXT_TIME_FORMAT),
    }
}

fn write_json_key(out: &mut String, key: &str) {
    write_json_str(out, key);
    out.push(':');
}

fn write_json_str(out: &mut String, s: &str) {
    // Serializing a str into a String cannot fail.
    if let Ok(quoted) = serde_json::to_string(s) {
        out.push_str(&quoted);
    }
}

fn write_json_time(out: &mut String, t: &DateTime<Utc>, format: &str) {
    out.push('"');
    let _ = write!(out, "{}", t.format(format));
    out.push('"');
}

fn write_float(out: &mut String, f: f64) {
    if f.is_nan() {
        out.push_str("NaN");
    } else if f.is_infinite() {
        out.push_str(if f > 0.0 { "+Inf" } else { "-Inf" });
    } else {
        let _ = write!(out, "{f}");
    }
}

fn write_json_value(out: &mut String, value: &Value, time_format: &str) {
    match value {
        Value::Null => out.push_str("null"),
        Value::Str(s) => write_json_str(out, s),
        Value::Opaque(s) => write_json_str(out, s),
        Value::I64(i) => {
            let _ = write!(out, "{i}");
        }
        Value::U64(u) => {
            let _ = write!(out, "{u}");
        }
        Value::F64(f) if f.is_finite() => {
            let _ = write!(out, "{f}");
        }
        Value::F64(f) => {
            let mut s = String::new();
            write_float(&mut s, *f);
            write_json_str(out, &s);
        }
        Value::Bool(b) => {
            let _ = write!(out, "{b}");
        }
        Value::Time(t) => write_json_time(out, t, time_format),
        Value::Duration(d) => {
            let _ = write!(out, "{}", d.as_nanos());
        }
        Value::Map(entries) => {
            out.push('{');
            for (i, (key, value)) in entries.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_json_key(out, key);
                write_json_value(out, value, time_format);
            }
            out.push('}');
        }
        Value::Seq(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_json_value(out, item, time_format);
            }
            out.push(']');
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = String::new();
        write_text_value(&mut out, self);
        f.write_str(&out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Caller, Fields};
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    fn fixed_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 9, 7, 5, 1).unwrap() + chrono::Duration::milliseconds(42)
    }

    fn encode_str(encoder: &dyn Encoder, record: &Record<'_>) -> String {
        String::from_utf8(encoder.encode(record)).unwrap()
    }

    #[test]
    fn test_text_layout() {
        let context = [Field::new("user", "ada")];
        let record = Record::new(Level::Info, "signed in")
            .with_timestamp(fixed_time())
            .with_caller(Caller::new("app/src/auth.rs", 12))
            .with_context(&context)
            .with_fields(vec![
                Field::new("attempts", 2),
                Field::new("took", Duration::from_millis(3)),
            ]);

        assert_eq!(
            encode_str(&TextEncoder::new(), &record),
            concat!(
                "2024-03-09 07:05:01.042|info|src/auth.rs:12|signed in|",
                "user=ada|attempts=2|took=3000000\n",
            )
        );
    }

    #[test]
    fn test_text_separator_and_capital_levels() {
        let record = Record::new(Level::Warn, "disk low").with_timestamp(fixed_time());
        let encoder = TextEncoder::new()
            .with_separator(" ")
            .with_level_encoder(LevelEncoder::Capital);
        assert_eq!(
            encode_str(&encoder, &record),
            "2024-03-09 07:05:01.042 WARN disk low\n"
        );

        let tabbed = TextEncoder::new().with_separator("");
        assert_eq!(tabbed.separator(), "\t");
    }

    #[test]
    fn test_text_nested_values_render_as_json() {
        let record = Record::new(Level::Debug, "m")
            .with_timestamp(fixed_time())
            .with_fields(vec![
                Field::new("tags", vec!["a", "b"]),
                Field::new("peer", Fields::from([("ip", "10.0.0.1")])),
            ]);
        assert_eq!(
            encode_str(&TextEncoder::new(), &record),
            "2024-03-09 07:05:01.042|debug|m|tags=[\"a\",\"b\"]|peer={\"ip\":\"10.0.0.1\"}\n"
        );
    }

    #[test]
    fn test_json_layout_keeps_shadowed_keys() {
        let context = [Field::new("k", "old")];
        let record = Record::new(Level::Error, "boom \"quoted\"")
            .with_timestamp(fixed_time())
            .with_caller(Caller::new("src/lib.rs", 7))
            .with_context(&context)
            .with_fields(vec![Field::new("k", "new"), Field::new("ratio", f64::NAN)]);

        assert_eq!(
            encode_str(&JsonEncoder::new(), &record),
            "{\"lvl\":\"error\",\"@t\":\"2024-03-09T07:05:01.042\",\"caller\":\"src/lib.rs:7\",\
             \"msg\":\"boom \\\"quoted\\\"\",\"k\":\"old\",\"k\":\"new\",\"ratio\":\"NaN\"}\n"
        );
    }

    #[test]
    fn test_json_round_trip() {
        let record = Record::new(Level::Warn, "cache miss")
            .with_timestamp(fixed_time())
            .with_fields(vec![
                Field::new("key", "user:1"),
                Field::new("size", 512u64),
                Field::new("hit", false),
                Field::new("at", fixed_time()),
                Field::new("opaque", Value::debug(("x", 1))),
            ]);
        let encoded = JsonEncoder::new().encode(&record);
        let parsed: serde_json::Value = serde_json::from_slice(&encoded).unwrap();

        assert_eq!(parsed[MESSAGE_KEY], "cache miss");
        assert_eq!(parsed[LEVEL_KEY], "warn");
        assert_eq!(parsed["key"], "user:1");
        assert_eq!(parsed["size"], 512);
        assert_eq!(parsed["hit"], false);
        assert_eq!(parsed["at"], "2024-03-09T07:05:01.042");
        assert_eq!(parsed["opaque"], "(\"x\", 1)");
        assert_eq!(parsed.get(CALLER_KEY), None);
    }

    #[test]
    fn test_custom_level_encoder() {
        fn short(level: Level) -> &'static str {
            &level.as_capital_str()[..1]
        }
        let record = Record::new(Level::Error, "m").with_timestamp(fixed_time());
        let encoder = JsonEncoder::new().with_level_encoder(LevelEncoder::Custom(short));
        let parsed: serde_json::Value =
            serde_json::from_slice(&encoder.encode(&record)).unwrap();
        assert_eq!(parsed[LEVEL_KEY], "E");
    }
}
