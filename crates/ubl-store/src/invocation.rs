//! Per-invocation staging over a [`StateStore`].
//!
//! An [`Invocation`] is the unit of atomicity. Everything written through it
//! lands in a private write-set; reads consult that write-set before falling
//! back to committed state. Committed reads are recorded with the version
//! observed so the store can reject the batch at commit time if another
//! invocation has changed them in the meantime.

use std::collections::BTreeMap;
use std::ops::Bound;

use tracing::debug;

use crate::batch::{InvocationId, KeyValue, RangeRead, ReadRecord, WriteBatch, WriteOp};
use crate::error::StoreResult;
use crate::traits::{StateStore, Stub};

/// A single in-flight invocation against a state store.
pub struct Invocation<'s> {
    id: InvocationId,
    store: &'s dyn StateStore,
    /// `None` marks a staged deletion.
    writes: BTreeMap<String, Option<Vec<u8>>>,
    reads: BTreeMap<String, Option<u64>>,
    range_reads: Vec<RangeRead>,
}

impl<'s> Invocation<'s> {
    /// Begin an invocation with a fresh id.
    pub fn begin(store: &'s dyn StateStore) -> Self {
        Self::with_id(store, InvocationId::new())
    }

    /// Begin an invocation with a caller-chosen id.
    pub fn with_id(store: &'s dyn StateStore, id: InvocationId) -> Self {
        Self {
            id,
            store,
            writes: BTreeMap::new(),
            reads: BTreeMap::new(),
            range_reads: Vec::new(),
        }
    }

    pub fn id(&self) -> InvocationId {
        self.id
    }

    /// Finish the invocation and produce the batch to commit.
    pub fn into_batch(self) -> WriteBatch {
        WriteBatch {
            invocation: self.id,
            reads: self
                .reads
                .into_iter()
                .map(|(key, version)| ReadRecord { key, version })
                .collect(),
            range_reads: self.range_reads,
            writes: self
                .writes
                .into_iter()
                .map(|(key, value)| match value {
                    Some(value) => WriteOp::Put { key, value },
                    None => WriteOp::Delete { key },
                })
                .collect(),
        }
    }

    /// Drop the invocation and everything it staged.
    pub fn discard(self) {
        debug!(
            invocation = %self.id,
            staged = self.writes.len(),
            "invocation discarded"
        );
    }
}

impl Stub for Invocation<'_> {
    fn get_state(&mut self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        if let Some(staged) = self.writes.get(key) {
            return Ok(staged.clone());
        }
        let committed = self.store.get(key)?;
        self.reads
            .entry(key.to_string())
            .or_insert_with(|| committed.as_ref().map(|v| v.version));
        Ok(committed.map(|v| v.value))
    }

    fn put_state(&mut self, key: &str, value: Vec<u8>) -> StoreResult<()> {
        self.writes.insert(key.to_string(), Some(value));
        Ok(())
    }

    fn del_state(&mut self, key: &str) -> StoreResult<()> {
        self.writes.insert(key.to_string(), None);
        Ok(())
    }

    fn get_state_by_range(&mut self, start: &str, end: &str) -> StoreResult<Vec<KeyValue>> {
        if start >= end {
            return Ok(Vec::new());
        }
        let committed = self.store.range(start, end)?;
        self.range_reads.push(RangeRead {
            start: start.to_string(),
            end: end.to_string(),
            observed: committed
                .iter()
                .map(|(k, v)| (k.clone(), v.version))
                .collect(),
        });

        let mut merged: BTreeMap<String, Vec<u8>> = committed
            .into_iter()
            .map(|(k, v)| (k, v.value))
            .collect();
        for (key, staged) in self
            .writes
            .range::<str, _>((Bound::Included(start), Bound::Excluded(end)))
        {
            match staged {
                Some(value) => {
                    merged.insert(key.clone(), value.clone());
                }
                None => {
                    merged.remove(key);
                }
            }
        }

        Ok(merged
            .into_iter()
            .map(|(key, value)| KeyValue { key, value })
            .collect())
    }
}

impl std::fmt::Debug for Invocation<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Invocation")
            .field("id", &self.id)
            .field("staged_writes", &self.writes.len())
            .field("reads", &self.reads.len())
            .finish()
    }
}
