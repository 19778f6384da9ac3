//! Invocation host for the User/Bank Ledger.
//!
//! The host is the outer edge of the ledger: it turns a named operation with
//! positional string arguments into one [`Invocation`](ubl_store::Invocation),
//! runs it through the [`Ledger`](ubl_ledger::Ledger), and commits the
//! resulting write-set only if every step succeeded. Failures discard the
//! whole write-set and come back as a [`Response`] carrying an error code.
//!
//! # Modules
//!
//! - [`operation`] -- the operation table and argument parsing
//! - [`response`] -- the JSON response envelope
//! - [`host`] -- the [`Host`] itself
//! - [`config`] -- TOML host configuration

pub mod config;
pub mod error;
pub mod host;
pub mod operation;
pub mod response;

pub use config::HostConfig;
pub use error::{HostError, HostResult};
pub use host::{Executed, Host};
pub use operation::{Operation, Signature, SIGNATURES};
pub use response::{ErrorBody, ErrorCode, Response, Status};
