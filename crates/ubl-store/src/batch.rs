//! Values exchanged between invocations and state stores.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier of one invocation (UUID v7, so ids sort by start time).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct InvocationId(Uuid);

impl InvocationId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for InvocationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for InvocationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A committed value and the store height at which it was last written.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionedValue {
    pub value: Vec<u8>,
    pub version: u64,
}

/// A key and its value as seen by an invocation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyValue {
    pub key: String,
    pub value: Vec<u8>,
}

/// A single staged write.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum WriteOp {
    Put { key: String, value: Vec<u8> },
    Delete { key: String },
}

impl WriteOp {
    pub fn key(&self) -> &str {
        match self {
            WriteOp::Put { key, .. } | WriteOp::Delete { key } => key,
        }
    }
}

/// A committed-state point read: the key and the version observed
/// (`None` if the key was absent).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReadRecord {
    pub key: String,
    pub version: Option<u64>,
}

/// A committed-state range read and every `(key, version)` it observed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RangeRead {
    pub start: String,
    pub end: String,
    pub observed: Vec<(String, u64)>,
}

/// Everything an invocation hands to the store for commit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WriteBatch {
    pub invocation: InvocationId,
    pub reads: Vec<ReadRecord>,
    pub range_reads: Vec<RangeRead>,
    /// Ordered by key; at most one op per key.
    pub writes: Vec<WriteOp>,
}

impl WriteBatch {
    /// Returns `true` if committing this batch would change no state.
    pub fn is_read_only(&self) -> bool {
        self.writes.is_empty()
    }
}

/// Durable form of one committed batch, as written to the commit log.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitRecord {
    pub height: u64,
    pub invocation: InvocationId,
    pub committed_at: DateTime<Utc>,
    pub writes: Vec<WriteOp>,
}

/// Result of a successful commit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommitReceipt {
    pub invocation: InvocationId,
    /// Store height after the commit. Unchanged for read-only batches.
    pub height: u64,
    pub writes: usize,
}
