//! Rotating file sink for strata-logger
//!
//! This crate provides [`RotatingFileSink`], a sink that appends encoded
//! records to one active file and rotates it into timestamped backups:
//! - rotation when the next write would push the file past its size limit
//! - optional gzip compression of rotated files
//! - pruning of backups by age and by count, oldest first
//!
//! All file operations are synchronous. A single lock per sink serializes
//! the size check, rotation and write, so records are never split across
//! files and a file is never renamed during a write.

#![warn(missing_docs, unreachable_pub)]
#![forbid(unsafe_code)]

mod backup;
mod error;
mod policy;
mod writer;

pub use backup::Backup;
pub use error::{Error, Result};
pub use policy::{DEFAULT_MAX_SIZE_MB, RotationPolicy};
pub use writer::RotatingFileSink;
