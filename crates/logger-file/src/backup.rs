//! Naming, discovery and retention of rotated files
//!
//! A rotated copy of `dir/<stem><ext>` is named
//! `dir/<stem>-<YYYY-MM-DDTHH-MM-SS.mmm>[.<n>]<ext>[.gz]`, where the UTC
//! timestamp is the moment of rotation and `.<n>` disambiguates rotations
//! within the same millisecond.

use crate::{Error, Result, RotationPolicy};
use chrono::{DateTime, DurationRound, NaiveDateTime, TimeDelta, Utc};
use flate2::Compression;
use flate2::write::GzEncoder;
use std::fs::{self, File};
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};

const BACKUP_TIME_FORMAT: &str = "%Y-%m-%dT%H-%M-%S%.3f";
const BACKUP_TIME_LEN: usize = "2006-01-02T15-04-05.000".len();
const GZIP_SUFFIX: &str = ".gz";

/// A rotated log file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Backup {
    path: PathBuf,
    timestamp: DateTime<Utc>,
    sequence: u32,
    compressed: bool,
}

impl Backup {
    /// Location on disk
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// When the file was rotated
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Disambiguator for rotations within one millisecond
    pub fn sequence(&self) -> u32 {
        self.sequence
    }

    /// Whether the backup is gzipped
    pub fn is_compressed(&self) -> bool {
        self.compressed
    }
}

/// Backup names derived from one active file path
#[derive(Debug, Clone)]
pub(crate) struct Naming {
    dir: PathBuf,
    stem: String,
    ext: String,
}

impl Naming {
    pub(crate) fn new(path: &Path) -> Self {
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let ext = path
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_default();
        Self { dir, stem, ext }
    }

    pub(crate) fn dir(&self) -> &Path {
        &self.dir
    }

    fn backup_path(&self, timestamp: DateTime<Utc>, sequence: u32) -> PathBuf {
        let mut name = format!("{}-{}", self.stem, timestamp.format(BACKUP_TIME_FORMAT));
        if sequence > 0 {
            name.push('.');
            name.push_str(&sequence.to_string());
        }
        name.push_str(&self.ext);
        self.dir.join(name)
    }

    /// First free backup name at `now`, ordered after the `previous` rotation
    pub(crate) fn next_backup(&self, now: DateTime<Utc>, previous: Option<&Backup>) -> Backup {
        let now = now
            .duration_trunc(TimeDelta::milliseconds(1))
            .unwrap_or(now);
        let (timestamp, mut sequence) = match previous {
            Some(previous) if previous.timestamp >= now => {
                (previous.timestamp, previous.sequence + 1)
            }
            _ => (now, 0),
        };
        loop {
            let path = self.backup_path(timestamp, sequence);
            if !path.exists() && !gzip_path(&path).exists() {
                return Backup {
                    path,
                    timestamp,
                    sequence,
                    compressed: false,
                };
            }
            sequence += 1;
        }
    }

    fn parse(&self, path: PathBuf) -> Option<Backup> {
        let name = path.file_name()?.to_str()?;
        let (name, compressed) = match name.strip_suffix(GZIP_SUFFIX) {
            Some(name) => (name, true),
            None => (name, false),
        };
        let rest = name
            .strip_prefix(self.stem.as_str())?
            .strip_prefix('-')?
            .strip_suffix(self.ext.as_str())?;

        let stamp = rest.get(..BACKUP_TIME_LEN)?;
        let timestamp = NaiveDateTime::parse_from_str(stamp, BACKUP_TIME_FORMAT)
            .ok()?
            .and_utc();
        let sequence = match rest.get(BACKUP_TIME_LEN..)? {
            "" => 0,
            suffix => suffix.strip_prefix('.')?.parse().ok()?,
        };

        Some(Backup {
            path,
            timestamp,
            sequence,
            compressed,
        })
    }

    /// Retained backups, oldest first
    pub(crate) fn list(&self) -> io::Result<Vec<Backup>> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };

        let mut backups = Vec::new();
        for entry in entries {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            if let Some(backup) = self.parse(entry.path()) {
                backups.push(backup);
            }
        }
        backups.sort_by_key(|b| (b.timestamp, b.sequence));
        Ok(backups)
    }
}

fn gzip_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(GZIP_SUFFIX);
    PathBuf::from(name)
}

/// Gzip a backup in place, removing the uncompressed file
pub(crate) fn compress(backup: &mut Backup) -> Result<()> {
    let target = gzip_path(&backup.path);
    if let Err(source) = gzip(&backup.path, &target) {
        let _ = fs::remove_file(&target);
        return Err(Error::Compression {
            path: backup.path.clone(),
            source,
        });
    }
    fs::remove_file(&backup.path).map_err(|source| Error::Compression {
        path: backup.path.clone(),
        source,
    })?;

    backup.path = target;
    backup.compressed = true;
    Ok(())
}

fn gzip(source: &Path, target: &Path) -> io::Result<()> {
    let mut input = BufReader::new(File::open(source)?);
    let mut encoder = GzEncoder::new(File::create(target)?, Compression::default());
    io::copy(&mut input, &mut encoder)?;
    encoder.finish()?.sync_all()
}

/// Delete backups past the age limit, then the oldest beyond the count limit.
///
/// Every doomed backup is attempted; the first failure is returned.
pub(crate) fn prune(
    backups: Vec<Backup>,
    policy: &RotationPolicy,
    now: DateTime<Utc>,
) -> Result<()> {
    let cutoff = policy.age_cutoff(now);
    let (mut doomed, kept): (Vec<_>, Vec<_>) = backups
        .into_iter()
        .partition(|b| cutoff.is_some_and(|cutoff| b.timestamp < cutoff));
    if policy.max_backups > 0 && kept.len() > policy.max_backups {
        let excess = kept.len() - policy.max_backups;
        doomed.extend(kept.into_iter().take(excess));
    }

    let mut first = Ok(());
    for backup in &doomed {
        if let Err(e) = remove_if_present(backup.path())
            && first.is_ok()
        {
            first = Err(e);
        }
    }
    first
}

fn remove_if_present(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e.into()),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: u32, millis: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 9, 7, 5, secs).unwrap()
            + TimeDelta::milliseconds(i64::from(millis))
    }

    #[test]
    fn test_backup_names() {
        let naming = Naming::new(Path::new("logs/app_info.log"));
        assert_eq!(
            naming.backup_path(at(1, 42), 0),
            Path::new("logs/app_info-2024-03-09T07-05-01.042.log")
        );
        assert_eq!(
            naming.backup_path(at(1, 42), 3),
            Path::new("logs/app_info-2024-03-09T07-05-01.042.3.log")
        );
    }

    #[test]
    fn test_parse_round_trips_names() {
        let naming = Naming::new(Path::new("logs/app.log"));
        let backup = naming
            .parse(PathBuf::from("logs/app-2024-03-09T07-05-01.042.2.log.gz"))
            .unwrap();
        assert_eq!(backup.timestamp(), at(1, 42));
        assert_eq!(backup.sequence(), 2);
        assert!(backup.is_compressed());
    }

    #[test]
    fn test_parse_rejects_foreign_files() {
        let naming = Naming::new(Path::new("logs/app.log"));
        for name in [
            "logs/app.log",
            "logs/other-2024-03-09T07-05-01.042.log",
            "logs/app-2024-03-09T07-05-01.042.txt",
            "logs/app-yesterday.log",
            "logs/app-2024-03-09T07-05-01.042.x.log",
        ] {
            assert!(naming.parse(PathBuf::from(name)).is_none(), "{name}");
        }
    }

    #[test]
    fn test_next_backup_orders_after_previous() {
        let dir = tempfile::tempdir().unwrap();
        let naming = Naming::new(&dir.path().join("app.log"));
        let now = at(1, 42) + TimeDelta::microseconds(500);

        let first = naming.next_backup(now, None);
        assert_eq!(first.timestamp(), at(1, 42));
        assert_eq!(first.sequence(), 0);

        let second = naming.next_backup(now, Some(&first));
        assert_eq!(second.sequence(), 1);

        // A clock that stepped back still sorts after the previous rotation
        let third = naming.next_backup(at(0, 0), Some(&second));
        assert_eq!((third.timestamp(), third.sequence()), (at(1, 42), 2));
    }

    #[test]
    fn test_bare_file_name_uses_current_dir() {
        let naming = Naming::new(Path::new("app"));
        assert_eq!(naming.dir(), Path::new("."));
        assert_eq!(
            naming.backup_path(at(1, 0), 0),
            Path::new("./app-2024-03-09T07-05-01.000")
        );
    }
}
