//! Severity levels and the shared level gate

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU8, Ordering};

/// Log severity, ordered from least to most severe
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum Level {
    /// Verbose diagnostics
    Debug = 0,
    /// Normal operational messages
    #[default]
    Info = 1,
    /// Something unexpected that does not stop the program
    Warn = 2,
    /// A failure the program can recover from
    Error = 3,
    /// Escalates like `Panic` in development mode, otherwise logs like `Error`
    #[serde(rename = "dpanic")]
    DPanic = 4,
    /// Logs, then escalates to the caller
    Panic = 5,
    /// Logs, then terminates the process
    Fatal = 6,
}

impl Level {
    /// All levels in ascending order
    pub const ALL: [Self; 7] = [
        Self::Debug,
        Self::Info,
        Self::Warn,
        Self::Error,
        Self::DPanic,
        Self::Panic,
        Self::Fatal,
    ];

    /// Lowercase name of the level
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
            Self::DPanic => "dpanic",
            Self::Panic => "panic",
            Self::Fatal => "fatal",
        }
    }

    /// Uppercase name of the level
    pub const fn as_capital_str(self) -> &'static str {
        match self {
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Warn => "WARN",
            Self::Error => "ERROR",
            Self::DPanic => "DPANIC",
            Self::Panic => "PANIC",
            Self::Fatal => "FATAL",
        }
    }

    /// Whether records at this level belong to the error channel
    #[inline]
    pub const fn is_error_band(self) -> bool {
        self as u8 >= Self::Warn as u8
    }

    /// Whether logging at this level escalates after the record is written
    #[inline]
    pub const fn escalates(self, development: bool) -> bool {
        match self {
            Self::Panic | Self::Fatal => true,
            Self::DPanic => development,
            _ => false,
        }
    }

    const fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Debug,
            1 => Self::Info,
            2 => Self::Warn,
            3 => Self::Error,
            4 => Self::DPanic,
            5 => Self::Panic,
            _ => Self::Fatal,
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string does not name a level
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unrecognized level: {0:?}")]
pub struct ParseLevelError(pub String);

impl FromStr for Level {
    type Err = ParseLevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" | "warning" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            "dpanic" => Ok(Self::DPanic),
            "panic" => Ok(Self::Panic),
            "fatal" => Ok(Self::Fatal),
            _ => Err(ParseLevelError(s.to_string())),
        }
    }
}

impl<'de> Deserialize<'de> for Level {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        name.parse().map_err(serde::de::Error::custom)
    }
}

/// Minimum enabled severity, shared by every channel that gates on it.
///
/// Reads and writes are single atomic operations. A `set` is visible to
/// subsequent checks on all threads, with no ordering guarantee against
/// checks already in flight.
#[derive(Debug)]
pub struct LevelGate {
    level: AtomicU8,
}

impl LevelGate {
    /// Create a gate at the given level
    pub const fn new(level: Level) -> Self {
        Self {
            level: AtomicU8::new(level as u8),
        }
    }

    /// Current minimum level
    #[inline]
    pub fn get(&self) -> Level {
        Level::from_u8(self.level.load(Ordering::Relaxed))
    }

    /// Replace the minimum level
    #[inline]
    pub fn set(&self, level: Level) {
        self.level.store(level as u8, Ordering::Relaxed);
    }

    /// Check if a level passes the gate
    #[inline(always)]
    pub fn enabled(&self, level: Level) -> bool {
        level as u8 >= self.level.load(Ordering::Relaxed)
    }
}

impl Default for LevelGate {
    fn default() -> Self {
        Self::new(Level::Info)
    }
}
