//! The response envelope returned for every invocation.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use ubl_store::InvocationId;

use crate::error::HostError;

static NULL: Value = Value::Null;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Success,
    Failure,
}

/// Machine-readable failure class.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    NotFound,
    AlreadyExists,
    DecodeError,
    SubstrateError,
    InvalidArgument,
    UnknownFunction,
    /// Another invocation committed a conflicting change first; retrying
    /// may succeed.
    Conflict,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: ErrorCode,
    pub message: String,
}

/// Result of one invocation, as sent back to the caller.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub status: Status,
    pub invocation: InvocationId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
}

impl Response {
    pub fn success(invocation: InvocationId, payload: Value) -> Self {
        Self {
            status: Status::Success,
            invocation,
            payload: Some(payload),
            error: None,
        }
    }

    pub fn failure(invocation: InvocationId, error: &HostError) -> Self {
        Self {
            status: Status::Failure,
            invocation,
            payload: None,
            error: Some(ErrorBody {
                code: error.code(),
                message: error.to_string(),
            }),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == Status::Success
    }

    pub fn error_code(&self) -> Option<ErrorCode> {
        self.error.as_ref().map(|e| e.code)
    }

    /// The payload, or `Value::Null` for failures and unit results.
    pub fn payload(&self) -> &Value {
        self.payload.as_ref().unwrap_or(&NULL)
    }

    pub fn to_json(&self) -> String {
        // A Response holds only strings, JSON values, and enums, so this
        // cannot fail.
        serde_json::to_string(self).unwrap_or_default()
    }
}
