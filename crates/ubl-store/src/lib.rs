//! Ordered key-value state store for the User/Bank Ledger.
//!
//! This crate is the substrate the ledger repositories run on. Committed
//! state is an ordered map from string keys to versioned byte values. All
//! access from business logic goes through an [`Invocation`], which stages
//! writes in a private write-set and only reaches committed state when the
//! host commits the resulting [`WriteBatch`].
//!
//! # Storage Backends
//!
//! All backends implement the [`StateStore`] trait:
//!
//! - [`InMemoryStateStore`] -- `BTreeMap`-based store for tests and embedding
//! - [`DurableStateStore`] -- in-memory state replayed from an on-disk
//!   [`CommitLog`]
//!
//! # Design Rules
//!
//! 1. Reads inside an invocation see that invocation's own staged writes.
//! 2. Nothing an invocation writes is visible elsewhere before commit.
//! 3. A commit applies all of a batch's writes or none of them.
//! 4. A commit fails with [`StoreError::Conflict`] if anything the
//!    invocation read from committed state has changed since.
//! 5. Dropping an invocation discards its write-set.
//! 6. All I/O errors are propagated, never silently ignored.

pub mod batch;
pub mod durable;
pub mod error;
pub mod invocation;
pub mod memory;
pub mod traits;
pub mod wal;

pub use batch::{
    CommitReceipt, CommitRecord, InvocationId, KeyValue, RangeRead, ReadRecord, VersionedValue,
    WriteBatch, WriteOp,
};
pub use durable::DurableStateStore;
pub use error::{StoreError, StoreResult};
pub use invocation::Invocation;
pub use memory::InMemoryStateStore;
pub use traits::{StateStore, Stub};
pub use wal::{CommitLog, SyncMode};
