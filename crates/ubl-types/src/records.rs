//! Stored record types.
//!
//! Field defaults are part of the stored format: a user without
//! transactions omits the list entirely, and a bank record without a
//! counter decodes with a count of zero.

use serde::{Deserialize, Serialize};

/// A financial transaction, embedded in its owning [`User`].
///
/// Transactions are immutable and never stored as top-level records.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Caller-supplied natural key, globally unique.
    pub hash: String,
    /// Decimal amount kept as a string to avoid floating-point drift.
    pub amount: String,
    pub currency: String,
    pub date: String,
    /// Identifier of the [`Bank`] the transaction was made through.
    pub bank_id: String,
}

impl Transaction {
    pub fn new(
        hash: impl Into<String>,
        amount: impl Into<String>,
        currency: impl Into<String>,
        date: impl Into<String>,
        bank_id: impl Into<String>,
    ) -> Self {
        Self {
            hash: hash.into(),
            amount: amount.into(),
            currency: currency.into(),
            date: date.into(),
            bank_id: bank_id.into(),
        }
    }
}

/// A ledger participant.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    /// Contact address. Older records stored this field as `email`.
    #[serde(alias = "email")]
    pub address: String,
    /// Append-only, in creation order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub transactions: Vec<Transaction>,
}

impl User {
    /// A user with no transactions.
    pub fn new(id: impl Into<String>, name: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            address: address.into(),
            transactions: Vec::new(),
        }
    }
}

/// A pre-provisioned institution and its aggregate transaction counter.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bank {
    pub id: String,
    pub name: String,
    /// Number of transactions ever created against this bank.
    #[serde(default)]
    pub transaction_count: u64,
}

impl Bank {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            transaction_count: 0,
        }
    }
}

/// Reverse lookup from a transaction hash to the user that owns it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxIndexEntry {
    pub hash: String,
    pub user_id: String,
}
