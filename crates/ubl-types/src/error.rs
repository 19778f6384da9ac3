use thiserror::Error;

/// Errors produced by key and codec operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TypeError {
    #[error("empty identifier for {space} key")]
    EmptyIdentifier { space: &'static str },

    #[error("encode error: {0}")]
    Encode(String),

    #[error("decode error: {0}")]
    Decode(String),
}

/// Result alias for type-level operations.
pub type TypeResult<T> = Result<T, TypeError>;
