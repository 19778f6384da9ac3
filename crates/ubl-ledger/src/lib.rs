//! Repository layer of the User/Bank Ledger (UBL).
//!
//! This crate maps users, banks, and the transaction-hash index onto the
//! prefix-partitioned key space of a [`Stub`](ubl_store::Stub). It provides:
//! - [`UserRepository`] -- CRUD and existence checks on users
//! - [`BankRepository`] -- bank reads and the counter increment
//! - [`TransactionIndex`] -- hash → owning user reverse lookup
//! - [`Ledger`] -- the orchestrator for every operation that spans more than
//!   one key space
//!
//! Nothing here commits. Every write is staged in the caller's invocation
//! and every failure is returned, so a host that discards failed
//! invocations gets all-or-nothing behavior for free.

pub mod banks;
pub mod config;
pub mod error;
pub mod ledger;
mod state;
pub mod tx_index;
pub mod users;

pub use banks::BankRepository;
pub use config::{BankSeed, LedgerConfig};
pub use error::{ErrorKind, LedgerError, LedgerResult};
pub use ledger::Ledger;
pub use tx_index::TransactionIndex;
pub use users::UserRepository;
