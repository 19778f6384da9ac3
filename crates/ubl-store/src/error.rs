/// Errors from state store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A key read by the invocation changed before its batch committed.
    #[error("read conflict on key {key}")]
    Conflict { key: String },

    /// Serialization or deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// I/O error from the underlying storage backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The commit log holds a record that cannot be applied.
    #[error("corrupt commit log at offset {offset}: {reason}")]
    CorruptLog { offset: u64, reason: String },

    /// Another handle holds the state directory.
    #[error("state directory {path} is locked by another process")]
    Locked { path: String },

    /// An append failed and the partial frame could not be cut off.
    #[error("commit log unusable after failed append at offset {offset}")]
    LogFailed { offset: u64 },

    /// A lock guarding the state was poisoned by a panicking writer.
    #[error("state lock poisoned: {0}")]
    LockPoisoned(String),
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
