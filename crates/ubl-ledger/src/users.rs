//! User records.
//!
//! All operations are single-key. Appending transactions is the
//! orchestrator's job; [`UserRepository::update`] only ever touches the
//! name and address.

use tracing::debug;
use ubl_store::Stub;
use ubl_types::{KeySpace, User};

use crate::error::{LedgerError, LedgerResult};
use crate::state;

/// Repository for [`User`] records under the `user:` prefix.
pub struct UserRepository<'a, S: Stub + ?Sized> {
    stub: &'a mut S,
}

impl<'a, S: Stub + ?Sized> UserRepository<'a, S> {
    pub fn new(stub: &'a mut S) -> Self {
        Self { stub }
    }

    pub fn exists(&mut self, id: &str) -> LedgerResult<bool> {
        state::exists(&mut *self.stub, KeySpace::User, id)
    }

    /// Create a user with an empty transaction list.
    ///
    /// Fails with `AlreadyExists` if the id is taken.
    pub fn create(&mut self, id: &str, name: &str, address: &str) -> LedgerResult<()> {
        if self.exists(id)? {
            return Err(LedgerError::already_exists(KeySpace::User, id));
        }
        state::write(&mut *self.stub, &User::new(id, name, address))?;
        debug!(user = id, "user created");
        Ok(())
    }

    pub fn get(&mut self, id: &str) -> LedgerResult<User> {
        state::require(&mut *self.stub, id)
    }

    /// Overwrite name and address, keeping the transaction list.
    pub fn update(&mut self, id: &str, name: &str, address: &str) -> LedgerResult<()> {
        let mut user = self.get(id)?;
        user.name = name.to_string();
        user.address = address.to_string();
        state::write(&mut *self.stub, &user)?;
        debug!(user = id, "user updated");
        Ok(())
    }

    /// Remove the user record only. [`Ledger::delete_user`](crate::Ledger::delete_user)
    /// also removes the user's index entries.
    pub(crate) fn delete(&mut self, id: &str) -> LedgerResult<()> {
        if !self.exists(id)? {
            return Err(LedgerError::not_found(KeySpace::User, id));
        }
        state::remove(&mut *self.stub, KeySpace::User, id)?;
        debug!(user = id, "user deleted");
        Ok(())
    }

    /// Every user, in key order.
    pub fn list(&mut self) -> LedgerResult<Vec<User>> {
        state::scan(&mut *self.stub)
    }

    /// Store `user` as-is, replacing any existing record.
    pub(crate) fn put(&mut self, user: &User) -> LedgerResult<()> {
        state::write(&mut *self.stub, user)
    }
}
