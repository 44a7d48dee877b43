//! Write-Ahead Log (WAL) for logged workouts.
//!
//! Workouts are appended to a JSONL (JSON Lines) file. Every access to the
//! WAL goes through a [`WalLock`] on a `.lock` sidecar next to it: appends and
//! rollups hold it exclusively, plain reads hold it shared.
//!
//! The sidecar keeps its inode when a rollup renames the WAL away, so an
//! append can never land in a file that has already been archived.

use crate::{Result, WorkoutRecord};
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

/// Destination for newly logged workouts
pub trait WorkoutSink {
    fn append(&mut self, record: &WorkoutRecord) -> Result<()>;
}

/// Held advisory lock on a WAL's sidecar, released on drop
pub struct WalLock {
    file: File,
}

impl WalLock {
    /// Block until the caller is the only holder
    pub fn exclusive(wal_path: &Path) -> Result<Self> {
        let file = open_sidecar(wal_path)?;
        file.lock_exclusive()?;
        Ok(Self { file })
    }

    /// Block until no exclusive holder remains
    pub fn shared(wal_path: &Path) -> Result<Self> {
        let file = open_sidecar(wal_path)?;
        file.lock_shared()?;
        Ok(Self { file })
    }
}

impl Drop for WalLock {
    fn drop(&mut self) {
        if let Err(e) = self.file.unlock() {
            tracing::warn!("Failed to release WAL lock: {}", e);
        }
    }
}

/// `<wal>.lock`, e.g. `workouts.wal.lock`
pub fn lock_path(wal_path: &Path) -> PathBuf {
    let mut name = wal_path.as_os_str().to_owned();
    name.push(".lock");
    PathBuf::from(name)
}

fn open_sidecar(wal_path: &Path) -> Result<File> {
    if let Some(parent) = wal_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .open(lock_path(wal_path))?;
    Ok(file)
}

/// JSONL-based workout sink
pub struct JsonlSink {
    path: PathBuf,
}

impl JsonlSink {
    /// Create a new JSONL sink for the given path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl WorkoutSink for JsonlSink {
    fn append(&mut self, record: &WorkoutRecord) -> Result<()> {
        let mut line = serde_json::to_string(record)?;
        line.push('\n');

        let _lock = WalLock::exclusive(&self.path)?;
        // Opened only under the lock, so a rollup's rename is never in flight
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(line.as_bytes())?;

        tracing::debug!("Appended workout {} for {} to WAL", record.id, record.user_id);
        Ok(())
    }
}

/// Read all workouts from a WAL file
///
/// Lines that fail to parse (e.g. a torn final write) are skipped with a
/// warning rather than failing the whole read.
pub fn read_workouts(path: &Path) -> Result<Vec<WorkoutRecord>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let _lock = WalLock::shared(path)?;
    read_workouts_unlocked(path)
}

/// Parse the WAL; the caller must already hold a [`WalLock`] on it
pub(crate) fn read_workouts_unlocked(path: &Path) -> Result<Vec<WorkoutRecord>> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    let mut records = Vec::new();
    for (line_num, line) in BufReader::new(file).lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        match serde_json::from_str::<WorkoutRecord>(&line) {
            Ok(record) => records.push(record),
            Err(e) => tracing::warn!("Skipping WAL line {}: {}", line_num + 1, e),
        }
    }

    tracing::debug!("Read {} workouts from WAL", records.len());
    Ok(records)
}
