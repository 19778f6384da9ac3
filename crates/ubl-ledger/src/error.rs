use std::fmt;

use ubl_store::StoreError;
use ubl_types::{KeySpace, TypeError};

/// Errors produced by repository and orchestrator operations.
///
/// Every variant names the entity kind and key involved so the message can
/// be surfaced verbatim.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("{kind} not found: {key}")]
    NotFound { kind: KeySpace, key: String },

    #[error("{kind} already exists: {key}")]
    AlreadyExists { kind: KeySpace, key: String },

    #[error("cannot decode {kind} record at {key}: {reason}")]
    Decode {
        kind: KeySpace,
        key: String,
        reason: String,
    },

    #[error("cannot encode {kind} record {key}: {reason}")]
    Encode {
        kind: KeySpace,
        key: String,
        reason: String,
    },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("transaction counter overflow for bank {bank}")]
    CounterOverflow { bank: String },

    #[error("substrate error: {0}")]
    Substrate(#[from] StoreError),
}

impl LedgerError {
    pub fn not_found(kind: KeySpace, key: impl Into<String>) -> Self {
        LedgerError::NotFound {
            kind,
            key: key.into(),
        }
    }

    pub fn already_exists(kind: KeySpace, key: impl Into<String>) -> Self {
        LedgerError::AlreadyExists {
            kind,
            key: key.into(),
        }
    }

    /// The externally observable failure class.
    pub fn kind(&self) -> ErrorKind {
        match self {
            LedgerError::NotFound { .. } => ErrorKind::NotFound,
            LedgerError::AlreadyExists { .. } => ErrorKind::AlreadyExists,
            LedgerError::Decode { .. } => ErrorKind::Decode,
            LedgerError::InvalidArgument(_) => ErrorKind::InvalidArgument,
            LedgerError::Encode { .. }
            | LedgerError::CounterOverflow { .. }
            | LedgerError::Substrate(_) => ErrorKind::Substrate,
        }
    }
}

impl From<TypeError> for LedgerError {
    fn from(e: TypeError) -> Self {
        LedgerError::InvalidArgument(e.to_string())
    }
}

/// Failure classes visible to callers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotFound,
    AlreadyExists,
    Decode,
    InvalidArgument,
    Substrate,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ErrorKind::NotFound => "NotFound",
            ErrorKind::AlreadyExists => "AlreadyExists",
            ErrorKind::Decode => "DecodeError",
            ErrorKind::InvalidArgument => "InvalidArgument",
            ErrorKind::Substrate => "SubstrateError",
        })
    }
}

/// Result alias for ledger operations.
pub type LedgerResult<T> = Result<T, LedgerError>;
