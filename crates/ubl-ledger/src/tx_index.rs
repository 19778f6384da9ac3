//! Reverse lookup from transaction hash to owning user.

use tracing::debug;
use ubl_store::Stub;
use ubl_types::{KeySpace, TxIndexEntry};

use crate::error::LedgerResult;
use crate::state;

/// Index of [`TxIndexEntry`] records under the `txidx:` prefix.
pub struct TransactionIndex<'a, S: Stub + ?Sized> {
    stub: &'a mut S,
}

impl<'a, S: Stub + ?Sized> TransactionIndex<'a, S> {
    pub fn new(stub: &'a mut S) -> Self {
        Self { stub }
    }

    /// Point `hash` at `user_id`, replacing any existing entry.
    ///
    /// No uniqueness check is made here; callers that must not repoint a
    /// hash check [`TransactionIndex::lookup`] first.
    pub fn put(&mut self, hash: &str, user_id: &str) -> LedgerResult<()> {
        let entry = TxIndexEntry {
            hash: hash.to_string(),
            user_id: user_id.to_string(),
        };
        state::write(&mut *self.stub, &entry)?;
        debug!(hash, user = user_id, "index entry written");
        Ok(())
    }

    /// The owning user of `hash`. Fails with `NotFound` if unindexed.
    pub fn resolve(&mut self, hash: &str) -> LedgerResult<String> {
        let entry: TxIndexEntry = state::require(&mut *self.stub, hash)?;
        Ok(entry.user_id)
    }

    /// Like [`resolve`](Self::resolve) but `None` when unindexed.
    pub fn lookup(&mut self, hash: &str) -> LedgerResult<Option<String>> {
        let entry: Option<TxIndexEntry> = state::read(&mut *self.stub, hash)?;
        Ok(entry.map(|e| e.user_id))
    }

    pub fn remove(&mut self, hash: &str) -> LedgerResult<()> {
        state::remove(&mut *self.stub, KeySpace::TransactionIndex, hash)?;
        debug!(hash, "index entry removed");
        Ok(())
    }
}
