//! The rotating file sink

use crate::backup::{self, Backup, Naming};
use crate::{Error, Result, RotationPolicy};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use strata_logger::Sink;

#[derive(Debug)]
struct State {
    file: Option<File>,
    size: u64,
    policy: RotationPolicy,
    last_backup: Option<Backup>,
}

/// Sink appending to one active file and rotating it into backups.
///
/// The size check, any rotation and the write happen under one lock, so a
/// record is never split across files and concurrent writers never create
/// two active files for the same path.
///
/// Compressing and pruning backups happens after the triggering record has
/// been written. A failure there is returned but never costs the record, and
/// one backup that cannot be compressed does not stop the others or the
/// pruning.
#[derive(Debug)]
pub struct RotatingFileSink {
    path: PathBuf,
    naming: Naming,
    state: Mutex<State>,
}

impl RotatingFileSink {
    /// Open `path` for appending, creating its directory if needed
    pub fn open(path: impl Into<PathBuf>, policy: RotationPolicy) -> Result<Self> {
        let path = path.into();
        let naming = Naming::new(&path);
        let sink = Self {
            path,
            naming,
            state: Mutex::new(State {
                file: None,
                size: 0,
                policy,
                last_backup: None,
            }),
        };

        let (file, size) = sink.open_active()?;
        {
            let mut state = sink.state.lock();
            state.file = Some(file);
            state.size = size;
        }
        Ok(sink)
    }

    /// Path of the active file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The rotation policy
    pub fn policy(&self) -> RotationPolicy {
        self.state.lock().policy
    }

    /// Replace the rotation policy; it applies from the next write
    pub fn set_policy(&self, policy: RotationPolicy) {
        self.state.lock().policy = policy;
    }

    /// Bytes in the active file
    pub fn size(&self) -> u64 {
        self.state.lock().size
    }

    /// Append one encoded record, rotating first if it would not fit
    pub fn write_record(&self, buf: &[u8]) -> Result<()> {
        let mut state = self.state.lock();
        let (mut file, mut size) = match state.file.take() {
            Some(file) => (file, state.size),
            None => self.open_active()?,
        };

        let len = buf.len() as u64;
        let mut rotated_at = None;
        if size > 0 && size.saturating_add(len) > state.policy.max_size_bytes {
            drop(file);
            let now = Utc::now();
            self.move_aside(&mut state, now)?;
            (file, size) = self.open_active()?;
            rotated_at = Some(now);
        }

        file.write_all(buf)?;
        state.file = Some(file);
        state.size = size + len;

        match rotated_at {
            Some(now) => self.clean_up(&state.policy, now),
            None => Ok(()),
        }
    }

    /// Rotate now, regardless of size
    pub fn rotate(&self) -> Result<()> {
        let mut state = self.state.lock();
        state.file = None;
        let now = Utc::now();
        self.move_aside(&mut state, now)?;
        let (file, size) = self.open_active()?;
        state.file = Some(file);
        state.size = size;
        self.clean_up(&state.policy, now)
    }

    /// Flush the active file to disk
    pub fn flush(&self) -> Result<()> {
        if let Some(file) = self.state.lock().file.as_mut() {
            file.sync_data()?;
        }
        Ok(())
    }

    /// Close the active file; the next write reopens it
    pub fn close(&self) -> Result<()> {
        let mut state = self.state.lock();
        if let Some(file) = state.file.take() {
            file.sync_data()?;
        }
        Ok(())
    }

    /// Retained backups, oldest first
    pub fn backups(&self) -> Result<Vec<Backup>> {
        Ok(self.naming.list()?)
    }

    fn open_active(&self) -> Result<(File, u64)> {
        let dir = self.naming.dir();
        fs::create_dir_all(dir).map_err(|source| Error::CreateDirectory {
            path: dir.to_path_buf(),
            source,
        })?;
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let size = file.metadata()?.len();
        Ok((file, size))
    }

    /// Rename the active file to the next backup name
    fn move_aside(&self, state: &mut State, now: DateTime<Utc>) -> Result<()> {
        let rotation = |source| Error::Rotation {
            path: self.path.clone(),
            source,
        };

        match fs::metadata(&self.path) {
            Ok(_) => {
                let target = self.naming.next_backup(now, state.last_backup.as_ref());
                fs::rename(&self.path, target.path()).map_err(rotation)?;
                state.last_backup = Some(target);
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(rotation(e)),
        }
    }

    /// Compress and prune backups, returning the first failure
    fn clean_up(&self, policy: &RotationPolicy, now: DateTime<Utc>) -> Result<()> {
        if !policy.compress && !policy.prunes() {
            return Ok(());
        }
        let mut backups = self.naming.list()?;
        let mut first = Ok(());
        if policy.compress {
            for backup in backups.iter_mut().filter(|b| !b.is_compressed()) {
                if let Err(e) = backup::compress(backup)
                    && first.is_ok()
                {
                    first = Err(e);
                }
            }
        }
        if let Err(e) = backup::prune(backups, policy, now)
            && first.is_ok()
        {
            first = Err(e);
        }
        first
    }
}

impl Sink for RotatingFileSink {
    fn write(&self, buf: &[u8]) -> io::Result<()> {
        Ok(self.write_record(buf)?)
    }

    fn flush(&self) -> io::Result<()> {
        Ok(RotatingFileSink::flush(self)?)
    }
}
