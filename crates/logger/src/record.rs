//! Log record type, built transiently for each emitted call

use crate::{Field, Level};
use chrono::{DateTime, Utc};
use std::borrow::Cow;
use std::fmt;
use std::panic::Location;

/// Source location of a log call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller {
    /// Source file
    pub file: &'static str,
    /// Line number
    pub line: u32,
}

impl Caller {
    /// Create a caller location
    pub const fn new(file: &'static str, line: u32) -> Self {
        Self { file, line }
    }

    /// Location of the nearest caller not marked `#[track_caller]`
    #[track_caller]
    #[inline]
    pub fn here() -> Self {
        Location::caller().into()
    }

    /// The file path trimmed to its last directory and file name
    pub fn short_file(&self) -> &'static str {
        let file = self.file;
        let mut separators = file.rmatch_indices(['/', '\\']);
        match (separators.next(), separators.next()) {
            (Some(_), Some((idx, _))) => &file[idx + 1..],
            _ => file,
        }
    }
}

impl From<&'static Location<'static>> for Caller {
    fn from(location: &'static Location<'static>) -> Self {
        Self::new(location.file(), location.line())
    }
}

impl fmt::Display for Caller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.short_file(), self.line)
    }
}

/// A log record - borrows the logger's context instead of copying it
#[derive(Debug, Clone)]
pub struct Record<'a> {
    /// Log level
    pub level: Level,
    /// The log message
    pub message: Cow<'a, str>,
    /// When the log was created
    pub timestamp: DateTime<Utc>,
    /// Call site, when caller reporting is enabled
    pub caller: Option<Caller>,
    /// Fields bound to the logger that produced the record
    pub context: &'a [Field],
    /// Fields passed to this call only
    pub fields: Vec<Field>,
}

impl<'a> Record<'a> {
    /// Create a new record stamped with the current time
    #[inline]
    pub fn new(level: Level, message: impl Into<Cow<'a, str>>) -> Self {
        Self {
            level,
            message: message.into(),
            timestamp: Utc::now(),
            caller: None,
            context: &[],
            fields: Vec::new(),
        }
    }

    /// Builder-style method for setting the timestamp
    #[inline]
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Builder-style method for setting location
    #[inline]
    pub fn with_caller(mut self, caller: Caller) -> Self {
        self.caller = Some(caller);
        self
    }

    /// Builder-style method for setting context
    #[inline]
    pub fn with_context(mut self, context: &'a [Field]) -> Self {
        self.context = context;
        self
    }

    /// Builder-style method for setting the per-call fields
    #[inline]
    pub fn with_fields(mut self, fields: Vec<Field>) -> Self {
        self.fields = fields;
        self
    }

    /// Context fields followed by per-call fields, in rendering order
    pub fn all_fields(&self) -> impl Iterator<Item = &Field> {
        self.context.iter().chain(self.fields.iter())
    }
}
