//! A state store that survives restarts.
//!
//! [`DurableStateStore`] keeps its working state in an
//! [`InMemoryStateStore`] and appends every committed batch to a
//! [`CommitLog`] before applying it. Opening the store replays the log.
//!
//! Only one handle may hold a state directory at a time. Each handle
//! validates commits against its own in-memory copy, so two handles on one
//! directory could both commit at the same height. `open` takes an
//! exclusive lock on [`LOCK_FILE`] and fails with [`StoreError::Locked`]
//! while another handle holds it.

use std::fs::{self, File, OpenOptions};
use std::path::Path;

use fs2::FileExt;
use tracing::info;

use crate::batch::{CommitReceipt, CommitRecord, VersionedValue, WriteBatch};
use crate::error::{StoreError, StoreResult};
use crate::memory::InMemoryStateStore;
use crate::traits::StateStore;
use crate::wal::{CommitLog, SyncMode};

/// File name of the commit log inside a state directory.
pub const COMMIT_LOG_FILE: &str = "commit.log";

/// File name of the directory lock inside a state directory.
pub const LOCK_FILE: &str = "LOCK";

pub struct DurableStateStore {
    state: InMemoryStateStore,
    log: CommitLog,
    /// Released when the store is dropped.
    _lock: File,
}

impl DurableStateStore {
    /// Lock the state directory `dir` and replay its commit log.
    pub fn open(dir: &Path, sync_mode: SyncMode) -> StoreResult<Self> {
        fs::create_dir_all(dir)?;
        let lock = lock_dir(dir)?;

        let log = CommitLog::open(&dir.join(COMMIT_LOG_FILE), sync_mode)?;
        let state = InMemoryStateStore::new();
        for (offset, record) in log.frames()? {
            state.replay(offset, &record)?;
        }
        info!(
            dir = %dir.display(),
            height = state.height()?,
            keys = state.len()?,
            "state store opened"
        );
        Ok(Self {
            state,
            log,
            _lock: lock,
        })
    }

    /// Every committed record in `dir`, oldest first.
    ///
    /// Reads the commit log without locking or repairing it, so it is safe
    /// while another handle has the directory open.
    pub fn read_history(dir: &Path) -> StoreResult<Vec<CommitRecord>> {
        CommitLog::scan(&dir.join(COMMIT_LOG_FILE))
    }
}

fn lock_dir(dir: &Path) -> StoreResult<File> {
    let file = OpenOptions::new()
        .create(true)
        .read(true)
        .write(true)
        .truncate(false)
        .open(dir.join(LOCK_FILE))?;
    match file.try_lock_exclusive() {
        Ok(()) => Ok(file),
        Err(e)
            if e.kind() == std::io::ErrorKind::WouldBlock
                || e.raw_os_error() == fs2::lock_contended_error().raw_os_error() =>
        {
            Err(StoreError::Locked {
                path: dir.display().to_string(),
            })
        }
        Err(e) => Err(e.into()),
    }
}

impl StateStore for DurableStateStore {
    fn get(&self, key: &str) -> StoreResult<Option<VersionedValue>> {
        self.state.get(key)
    }

    fn range(&self, start: &str, end: &str) -> StoreResult<Vec<(String, VersionedValue)>> {
        self.state.range(start, end)
    }

    fn commit(&self, batch: &WriteBatch) -> StoreResult<CommitReceipt> {
        self.state
            .commit_with(batch, |record| self.log.append(record).map(|_| ()))
    }

    fn height(&self) -> StoreResult<u64> {
        self.state.height()
    }
}

impl std::fmt::Debug for DurableStateStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DurableStateStore")
            .field("state", &self.state)
            .field("log", &self.log)
            .finish()
    }
}
