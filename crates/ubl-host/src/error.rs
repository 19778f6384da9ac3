//! Error types for the invocation host.

use thiserror::Error;
use ubl_ledger::{ErrorKind, LedgerError};
use ubl_store::StoreError;

use crate::response::ErrorCode;

#[derive(Debug, Error)]
pub enum HostError {
    #[error("unknown function: {0}")]
    UnknownFunction(String),

    #[error("{function} expects {expected} argument(s), got {actual}")]
    Arity {
        function: String,
        expected: usize,
        actual: usize,
    },

    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("cannot encode result: {0}")]
    Encode(#[from] serde_json::Error),
}

impl HostError {
    /// The error code reported in a failure response.
    pub fn code(&self) -> ErrorCode {
        match self {
            HostError::UnknownFunction(_) => ErrorCode::UnknownFunction,
            HostError::Arity { .. } | HostError::Config(_) => ErrorCode::InvalidArgument,
            HostError::Ledger(LedgerError::Substrate(e)) | HostError::Store(e) => store_code(e),
            HostError::Ledger(e) => match e.kind() {
                ErrorKind::NotFound => ErrorCode::NotFound,
                ErrorKind::AlreadyExists => ErrorCode::AlreadyExists,
                ErrorKind::Decode => ErrorCode::DecodeError,
                ErrorKind::InvalidArgument => ErrorCode::InvalidArgument,
                ErrorKind::Substrate => ErrorCode::SubstrateError,
            },
            HostError::Encode(_) => ErrorCode::SubstrateError,
        }
    }
}

fn store_code(e: &StoreError) -> ErrorCode {
    match e {
        StoreError::Conflict { .. } => ErrorCode::Conflict,
        _ => ErrorCode::SubstrateError,
    }
}

pub type HostResult<T> = Result<T, HostError>;
