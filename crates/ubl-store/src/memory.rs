use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::Utc;
use tracing::debug;

use crate::batch::{CommitReceipt, CommitRecord, VersionedValue, WriteBatch, WriteOp};
use crate::error::{StoreError, StoreResult};
use crate::traits::StateStore;

#[derive(Debug, Default)]
struct State {
    entries: BTreeMap<String, VersionedValue>,
    height: u64,
}

/// In-memory, `BTreeMap`-based state store.
///
/// Intended for tests and embedding, and used as the working set of
/// [`DurableStateStore`](crate::DurableStateStore). State lives behind a
/// `RwLock`; commits take the write lock for validation and apply, so
/// concurrent commits are serialized.
pub struct InMemoryStateStore {
    state: RwLock<State>,
}

impl InMemoryStateStore {
    /// Create a new empty store at height 0.
    pub fn new() -> Self {
        Self {
            state: RwLock::new(State::default()),
        }
    }

    /// Number of keys currently stored.
    pub fn len(&self) -> StoreResult<usize> {
        Ok(self.read_state()?.entries.len())
    }

    /// Returns `true` if the store holds no keys.
    pub fn is_empty(&self) -> StoreResult<bool> {
        Ok(self.read_state()?.entries.is_empty())
    }

    /// Validate `batch`, hand the resulting record to `persist`, then apply.
    ///
    /// `persist` runs under the write lock after validation succeeds; if it
    /// fails nothing is applied. Read-only batches skip `persist`.
    pub(crate) fn commit_with<F>(&self, batch: &WriteBatch, persist: F) -> StoreResult<CommitReceipt>
    where
        F: FnOnce(&CommitRecord) -> StoreResult<()>,
    {
        let mut state = self.write_state()?;
        validate(&state, batch)?;

        if batch.is_read_only() {
            return Ok(CommitReceipt {
                invocation: batch.invocation,
                height: state.height,
                writes: 0,
            });
        }

        let record = CommitRecord {
            height: state.height + 1,
            invocation: batch.invocation,
            committed_at: Utc::now(),
            writes: batch.writes.clone(),
        };
        persist(&record)?;
        apply(&mut state, &record);

        debug!(
            invocation = %batch.invocation,
            height = record.height,
            writes = record.writes.len(),
            "batch committed"
        );
        Ok(CommitReceipt {
            invocation: batch.invocation,
            height: record.height,
            writes: record.writes.len(),
        })
    }

    /// Apply a record read from the commit log frame at `offset`.
    ///
    /// The record must be the next height.
    pub(crate) fn replay(&self, offset: u64, record: &CommitRecord) -> StoreResult<()> {
        let mut state = self.write_state()?;
        if record.height != state.height + 1 {
            return Err(StoreError::CorruptLog {
                offset,
                reason: format!(
                    "commit record height {} does not follow {}",
                    record.height, state.height
                ),
            });
        }
        apply(&mut state, record);
        Ok(())
    }

    fn read_state(&self) -> StoreResult<RwLockReadGuard<'_, State>> {
        self.state
            .read()
            .map_err(|e| StoreError::LockPoisoned(e.to_string()))
    }

    fn write_state(&self) -> StoreResult<RwLockWriteGuard<'_, State>> {
        self.state
            .write()
            .map_err(|e| StoreError::LockPoisoned(e.to_string()))
    }
}

impl Default for InMemoryStateStore {
    fn default() -> Self {
        Self::new()
    }
}

impl StateStore for InMemoryStateStore {
    fn get(&self, key: &str) -> StoreResult<Option<VersionedValue>> {
        Ok(self.read_state()?.entries.get(key).cloned())
    }

    fn range(&self, start: &str, end: &str) -> StoreResult<Vec<(String, VersionedValue)>> {
        let state = self.read_state()?;
        Ok(scan(&state.entries, start, end)
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }

    fn commit(&self, batch: &WriteBatch) -> StoreResult<CommitReceipt> {
        self.commit_with(batch, |_| Ok(()))
    }

    fn height(&self) -> StoreResult<u64> {
        Ok(self.read_state()?.height)
    }
}

impl std::fmt::Debug for InMemoryStateStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut s = f.debug_struct("InMemoryStateStore");
        if let Ok(state) = self.state.read() {
            s.field("key_count", &state.entries.len())
                .field("height", &state.height);
        }
        s.finish()
    }
}

fn scan<'a>(
    entries: &'a BTreeMap<String, VersionedValue>,
    start: &str,
    end: &str,
) -> Box<dyn Iterator<Item = (&'a String, &'a VersionedValue)> + 'a> {
    // BTreeMap::range panics on inverted bounds.
    if start >= end {
        return Box::new(std::iter::empty());
    }
    Box::new(entries.range::<str, _>((Bound::Included(start), Bound::Excluded(end))))
}

fn validate(state: &State, batch: &WriteBatch) -> StoreResult<()> {
    for read in &batch.reads {
        let current = state.entries.get(&read.key).map(|v| v.version);
        if current != read.version {
            return Err(StoreError::Conflict {
                key: read.key.clone(),
            });
        }
    }

    for range in &batch.range_reads {
        let mut current = scan(&state.entries, &range.start, &range.end);
        for (key, version) in &range.observed {
            match current.next() {
                Some((k, v)) if k == key && v.version == *version => {}
                Some((k, _)) => {
                    return Err(StoreError::Conflict { key: k.clone() });
                }
                None => return Err(StoreError::Conflict { key: key.clone() }),
            }
        }
        // A key inserted into the range after it was read is a phantom.
        if let Some((k, _)) = current.next() {
            return Err(StoreError::Conflict { key: k.clone() });
        }
    }
    Ok(())
}

fn apply(state: &mut State, record: &CommitRecord) {
    for op in &record.writes {
        match op {
            WriteOp::Put { key, value } => {
                state.entries.insert(
                    key.clone(),
                    VersionedValue {
                        value: value.clone(),
                        version: record.height,
                    },
                );
            }
            WriteOp::Delete { key } => {
                state.entries.remove(key);
            }
        }
    }
    state.height = record.height;
}
