//! Bank records and their transaction counters.
//!
//! Banks are never created by ordinary callers: they are seeded once by
//! [`Ledger::initialize_ledger`](crate::Ledger::initialize_ledger). The
//! counter is only ever changed by [`BankRepository::increment_count`].

use tracing::debug;
use ubl_store::Stub;
use ubl_types::Bank;

use crate::error::{LedgerError, LedgerResult};
use crate::state;

/// Repository for [`Bank`] records under the `bank:` prefix.
pub struct BankRepository<'a, S: Stub + ?Sized> {
    stub: &'a mut S,
}

impl<'a, S: Stub + ?Sized> BankRepository<'a, S> {
    pub fn new(stub: &'a mut S) -> Self {
        Self { stub }
    }

    /// Fails with `NotFound` if the bank was never seeded.
    pub fn get(&mut self, id: &str) -> LedgerResult<Bank> {
        state::require(&mut *self.stub, id)
    }

    /// Read the bank, add one to its counter, write it back.
    pub fn increment_count(&mut self, id: &str) -> LedgerResult<Bank> {
        let mut bank = self.get(id)?;
        bank.transaction_count =
            bank.transaction_count
                .checked_add(1)
                .ok_or_else(|| LedgerError::CounterOverflow {
                    bank: id.to_string(),
                })?;
        state::write(&mut *self.stub, &bank)?;
        debug!(bank = id, count = bank.transaction_count, "bank counter incremented");
        Ok(bank)
    }

    /// Write a seeded bank.
    ///
    /// Re-seeding an existing bank refreshes its name and keeps its counter,
    /// so running initialization twice is harmless.
    pub(crate) fn seed(&mut self, id: &str, name: &str) -> LedgerResult<Bank> {
        let existing: Option<Bank> = state::read(&mut *self.stub, id)?;
        let bank = Bank {
            id: id.to_string(),
            name: name.to_string(),
            transaction_count: existing.map_or(0, |b| b.transaction_count),
        };
        state::write(&mut *self.stub, &bank)?;
        debug!(bank = id, "bank seeded");
        Ok(bank)
    }
}
