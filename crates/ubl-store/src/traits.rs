use crate::batch::{CommitReceipt, KeyValue, VersionedValue, WriteBatch};
use crate::error::StoreResult;

/// Committed, globally visible state.
///
/// All implementations must satisfy these invariants:
/// - Keys are ordered lexicographically by their UTF-8 bytes.
/// - `commit` validates the batch's read-set against current state and then
///   applies every write, or fails and applies none.
/// - Every key written by a commit takes the new height as its version.
/// - All I/O errors are propagated, never silently ignored.
pub trait StateStore: Send + Sync {
    /// Read a committed value and its version.
    ///
    /// Returns `Ok(None)` if the key does not exist.
    fn get(&self, key: &str) -> StoreResult<Option<VersionedValue>>;

    /// All committed entries with `start <= key < end`, ascending.
    fn range(&self, start: &str, end: &str) -> StoreResult<Vec<(String, VersionedValue)>>;

    /// Validate and atomically apply a batch.
    ///
    /// Fails with `StoreError::Conflict` if any recorded read no longer
    /// matches committed state. Read-only batches are validated but do not
    /// advance the height.
    fn commit(&self, batch: &WriteBatch) -> StoreResult<CommitReceipt>;

    /// Number of non-empty batches committed so far.
    fn height(&self) -> StoreResult<u64>;
}

/// The per-invocation view of state that business logic programs against.
///
/// Reads observe the caller's own staged writes. Writes are staged and only
/// become visible to others once the host commits the invocation.
pub trait Stub {
    /// Read a value, or `None` if absent (or deleted in this invocation).
    fn get_state(&mut self, key: &str) -> StoreResult<Option<Vec<u8>>>;

    /// Stage a write of `value` under `key`.
    fn put_state(&mut self, key: &str, value: Vec<u8>) -> StoreResult<()>;

    /// Stage a deletion of `key`.
    fn del_state(&mut self, key: &str) -> StoreResult<()>;

    /// All visible entries with `start <= key < end`, ascending by key.
    ///
    /// The result is materialized once per call.
    fn get_state_by_range(&mut self, start: &str, end: &str) -> StoreResult<Vec<KeyValue>>;
}
