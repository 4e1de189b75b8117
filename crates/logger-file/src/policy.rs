//! Rotation thresholds

use chrono::{DateTime, TimeDelta, Utc};

/// Size limit used when none is given, in megabytes
pub const DEFAULT_MAX_SIZE_MB: u64 = 100;

const MEGABYTE: u64 = 1024 * 1024;

/// When to rotate and which backups to keep
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RotationPolicy {
    /// Active file size that triggers a rotation
    pub max_size_bytes: u64,
    /// Backups older than this many days are deleted; 0 keeps them forever
    pub max_age_days: u32,
    /// Maximum number of retained backups; 0 keeps all
    pub max_backups: usize,
    /// Gzip rotated files
    pub compress: bool,
}

impl RotationPolicy {
    /// Policy from the megabyte-based settings; a size of 0 selects the default
    pub fn from_megabytes(max_size_mb: u64, max_age_days: u32, max_backups: usize) -> Self {
        let max_size_mb = if max_size_mb == 0 {
            DEFAULT_MAX_SIZE_MB
        } else {
            max_size_mb
        };
        Self {
            max_size_bytes: max_size_mb.saturating_mul(MEGABYTE),
            max_age_days,
            max_backups,
            compress: false,
        }
    }

    /// Set the size limit in bytes
    #[must_use]
    pub fn with_max_size_bytes(mut self, max_size_bytes: u64) -> Self {
        self.max_size_bytes = max_size_bytes;
        self
    }

    /// Enable or disable compression of rotated files
    #[must_use]
    pub fn with_compress(mut self, compress: bool) -> Self {
        self.compress = compress;
        self
    }

    /// Oldest backup timestamp still retained at `now`, if there is an age limit
    pub fn age_cutoff(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        if self.max_age_days == 0 {
            return None;
        }
        Some(now - TimeDelta::days(i64::from(self.max_age_days)))
    }

    pub(crate) fn prunes(&self) -> bool {
        self.max_age_days > 0 || self.max_backups > 0
    }
}

impl Default for RotationPolicy {
    fn default() -> Self {
        Self::from_megabytes(DEFAULT_MAX_SIZE_MB, 0, 0)
    }
}
