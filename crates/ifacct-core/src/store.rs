//! Monthly record files and the locking protocol around them.
//!
//! # Storage Format
//!
//! One file per (host, interface, month), named
//! `<root>/<host>-<interface>-<YYYY><MM>.dat` with a 1-based, zero-padded
//! month so names sort chronologically. See [`crate::record`] for the
//! contents.
//!
//! The name is not escaped, so it is only unambiguous while the host name
//! carries no `-`. Host `gw-br` with interface `lan` and host `gw` with
//! interface `br-lan` share one file, and [`RecordStore::list_months`]
//! reports both under either pair. Hosts sharing a storage root need
//! hyphen-free names.
//!
//! Every accumulate is a full read-modify-write under an exclusive lock held
//! across both phases; reads take a shared lock. A reader therefore sees
//! the file either before or after an accumulate, never in between, and two
//! writers serialize instead of losing an update.

use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::calendar::MonthKey;
use crate::config::AcctConfig;
use crate::delta::Delta;
use crate::error::{AcctError, Result};
use crate::lock::{FileLock, LockMode};
use crate::record::MonthlyRecord;

/// Extension of record files.
pub const RECORD_EXT: &str = "dat";

/// Deterministic record path for `(host, interface, month)` under `root`.
pub fn path_for(root: &Path, host: &str, interface: &str, key: MonthKey) -> PathBuf {
    root.join(format!(
        "{host}-{interface}-{}.{RECORD_EXT}",
        key.file_stamp()
    ))
}

/// Read the record at `path` under a shared lock.
///
/// A zero-length file is a record whose creator has not written it yet; it
/// reads as all-zero when the month can be taken from the file name and as
/// corrupt otherwise.
pub fn read_for_report(path: &Path, lock_timeout: Option<Duration>) -> Result<MonthlyRecord> {
    let file = File::open(path)?;
    let _lock = FileLock::acquire(&file, path, LockMode::Shared, lock_timeout)?;
    let bytes = read_all(&file)?;
    if bytes.is_empty() {
        return stamp_of(path)
            .map(MonthlyRecord::new)
            .ok_or_else(|| AcctError::corrupt(path, "empty record"));
    }
    MonthlyRecord::decode(&bytes, path)
}

fn read_all(mut file: &File) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)?;
    Ok(bytes)
}

/// Month stamp embedded in a record file name, if any.
fn stamp_of(path: &Path) -> Option<MonthKey> {
    let stem = path.file_stem()?.to_str()?;
    let (_, stamp) = stem.rsplit_once('-')?;
    MonthKey::from_file_stamp(stamp)
}

/// Record files for one host and interface.
#[derive(Debug, Clone)]
pub struct RecordStore {
    root: PathBuf,
    host: String,
    interface: String,
    lock_timeout: Option<Duration>,
}

impl RecordStore {
    pub fn new(root: impl Into<PathBuf>, host: &str, interface: &str) -> Self {
        Self {
            root: root.into(),
            host: host.to_string(),
            interface: interface.to_string(),
            lock_timeout: None,
        }
    }

    pub fn from_config(config: &AcctConfig) -> Self {
        Self::new(&config.storage_root, &config.host, &config.interface)
            .with_lock_timeout(config.lock_timeout)
    }

    /// Bound lock waits; `None` blocks.
    pub fn with_lock_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.lock_timeout = timeout;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, key: MonthKey) -> PathBuf {
        path_for(&self.root, &self.host, &self.interface, key)
    }

    /// Create the storage root if it does not exist.
    pub fn ensure_root(&self) -> Result<()> {
        fs::create_dir_all(&self.root)?;
        Ok(())
    }

    /// Load the record for `key`, or a zeroed one if none exists yet.
    pub fn load(&self, key: MonthKey) -> Result<MonthlyRecord> {
        let path = self.path_for(key);
        let file = match File::open(&path) {
            Ok(f) => f,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(MonthlyRecord::new(key)),
            Err(e) => return Err(e.into()),
        };
        let _lock = FileLock::acquire(&file, &path, LockMode::Shared, self.lock_timeout)?;
        decode_for(key, &read_all(&file)?, &path)
    }

    /// Add `delta` to the 1-based `day` of month `key` and persist the
    /// result. Returns the record as written.
    ///
    /// The exclusive lock is held from before the read until after the
    /// write and is released on every path, including errors.
    pub fn accumulate(&self, key: MonthKey, day: u32, delta: Delta) -> Result<MonthlyRecord> {
        let days_in_month = key.days();
        if day == 0 || day > days_in_month {
            return Err(AcctError::InvalidDay { day, days_in_month });
        }

        let path = self.path_for(key);
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)?;
        let lock = FileLock::acquire(&file, &path, LockMode::Exclusive, self.lock_timeout)?;

        let mut record = decode_for(key, &read_all(&file)?, &path)?;
        record.add(day, delta)?;

        // Whole record is built before the first byte is written.
        let encoded = record.encode();
        write_all_at_start(&file, &encoded)?;
        drop(lock);

        log::debug!(
            "{}: day {day} += ({delta}) -> rx={} tx={}",
            path.display(),
            record.days()[(day - 1) as usize].rx,
            record.days()[(day - 1) as usize].tx,
        );
        Ok(record)
    }

    /// Months with a record on disk for this host and interface, newest
    /// first.
    pub fn list_months(&self) -> Result<Vec<MonthKey>> {
        let entries = match fs::read_dir(&self.root) {
            Ok(e) => e,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        let prefix = format!("{}-{}-", self.host, self.interface);
        let suffix = format!(".{RECORD_EXT}");

        let mut months: Vec<MonthKey> = entries
            .flatten()
            .filter_map(|entry| {
                let name = entry.file_name().into_string().ok()?;
                let stamp = name.strip_prefix(&prefix)?.strip_suffix(&suffix)?;
                MonthKey::from_file_stamp(stamp)
            })
            .collect();
        months.sort_unstable_by(|a, b| b.cmp(a));
        Ok(months)
    }
}

/// Decode bytes read for `key`; empty means not yet written.
fn decode_for(key: MonthKey, bytes: &[u8], path: &Path) -> Result<MonthlyRecord> {
    if bytes.is_empty() {
        return Ok(MonthlyRecord::new(key));
    }
    let record = MonthlyRecord::decode(bytes, path)?;
    if record.key() != key {
        return Err(AcctError::corrupt(
            path,
            format!("header declares {} but the file is named for {key}", record.key()),
        ));
    }
    Ok(record)
}

fn write_all_at_start(mut file: &File, bytes: &[u8]) -> Result<()> {
    file.seek(SeekFrom::Start(0))?;
    file.write_all(bytes)?;
    file.set_len(bytes.len() as u64)?;
    file.flush()?;
    Ok(())
}
