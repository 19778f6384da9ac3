//! The record codec.
//!
//! Records are stored as JSON, a self-describing format in which absent
//! optional fields fall back to their serde defaults. The codec carries no
//! business logic.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{TypeError, TypeResult};
use crate::keys::{KeySpace, RecordKey};
use crate::records::{Bank, TxIndexEntry, User};

/// A record that lives in exactly one [`KeySpace`].
pub trait Record: Serialize + DeserializeOwned {
    /// The key space this record type occupies.
    const SPACE: KeySpace;

    /// Identifier of this record within its space.
    fn record_id(&self) -> &str;

    /// The state key this record is stored under.
    fn record_key(&self) -> TypeResult<RecordKey> {
        Self::SPACE.key(self.record_id())
    }

    fn encode(&self) -> TypeResult<Vec<u8>> {
        serde_json::to_vec(self).map_err(|e| TypeError::Encode(e.to_string()))
    }

    fn decode(bytes: &[u8]) -> TypeResult<Self> {
        serde_json::from_slice(bytes).map_err(|e| TypeError::Decode(e.to_string()))
    }
}

impl Record for User {
    const SPACE: KeySpace = KeySpace::User;

    fn record_id(&self) -> &str {
        &self.id
    }
}

impl Record for Bank {
    const SPACE: KeySpace = KeySpace::Bank;

    fn record_id(&self) -> &str {
        &self.id
    }
}

impl Record for TxIndexEntry {
    const SPACE: KeySpace = KeySpace::TransactionIndex;

    fn record_id(&self) -> &str {
        &self.hash
    }
}
