//! Foundation types for the User/Bank Ledger (UBL).
//!
//! Every other UBL crate depends on `ubl-types`. It defines what gets stored
//! and where it lives in the flat key namespace of the state store.
//!
//! # Key Types
//!
//! - [`User`] -- a ledger participant with embedded [`Transaction`]s
//! - [`Bank`] -- a pre-provisioned institution with an aggregate counter
//! - [`TxIndexEntry`] -- reverse lookup from transaction hash to owning user
//! - [`KeySpace`] / [`RecordKey`] -- prefix-partitioned state keys
//! - [`Record`] -- the JSON codec shared by all stored records

pub mod codec;
pub mod error;
pub mod keys;
pub mod records;

pub use codec::Record;
pub use error::{TypeError, TypeResult};
pub use keys::{KeySpace, RecordKey};
pub use records::{Bank, Transaction, TxIndexEntry, User};
