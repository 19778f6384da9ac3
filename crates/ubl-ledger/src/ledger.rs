//! The ledger orchestrator.
//!
//! [`Ledger`] is the only component that touches more than one key space in
//! a single call. It never commits: all of its writes are staged in the
//! invocation it was handed, and every error is returned as soon as it
//! happens. If `create_transaction` fails at the bank step, the user and
//! index writes staged before it are thrown away with the rest of the
//! invocation.

use std::str::FromStr;

use rust_decimal::Decimal;
use tracing::{debug, info};
use ubl_store::Stub;
use ubl_types::{Bank, KeySpace, Transaction, User};

use crate::banks::BankRepository;
use crate::config::LedgerConfig;
use crate::error::{LedgerError, LedgerResult};
use crate::tx_index::TransactionIndex;
use crate::users::UserRepository;

/// Orchestrates users, banks, and the transaction index over one invocation.
pub struct Ledger<'a, S: Stub + ?Sized> {
    stub: &'a mut S,
    config: &'a LedgerConfig,
}

impl<'a, S: Stub + ?Sized> Ledger<'a, S> {
    pub fn new(stub: &'a mut S, config: &'a LedgerConfig) -> Self {
        Self { stub, config }
    }

    pub fn users(&mut self) -> UserRepository<'_, S> {
        UserRepository::new(&mut *self.stub)
    }

    pub fn banks(&mut self) -> BankRepository<'_, S> {
        BankRepository::new(&mut *self.stub)
    }

    pub fn index(&mut self) -> TransactionIndex<'_, S> {
        TransactionIndex::new(&mut *self.stub)
    }

    /// Seed the configured bank set. Safe to run more than once.
    pub fn initialize_ledger(&mut self) -> LedgerResult<Vec<Bank>> {
        self.config.validate()?;
        let config = self.config;
        let mut banks = self.banks();
        let seeded = config
            .banks
            .iter()
            .map(|seed| banks.seed(&seed.id, &seed.name))
            .collect::<LedgerResult<Vec<_>>>()?;
        info!(banks = seeded.len(), "ledger initialized");
        Ok(seeded)
    }

    /// Record a transaction for `user_id` through `bank_id`.
    ///
    /// In order: load the user, append the transaction and write the user
    /// back, index the hash, increment the bank counter. A reused hash fails
    /// with `AlreadyExists` before anything is written.
    pub fn create_transaction(
        &mut self,
        user_id: &str,
        hash: &str,
        amount: &str,
        currency: &str,
        date: &str,
        bank_id: &str,
    ) -> LedgerResult<bool> {
        Decimal::from_str(amount).map_err(|e| {
            LedgerError::InvalidArgument(format!("amount {amount:?} is not a decimal: {e}"))
        })?;
        KeySpace::TransactionIndex.key(hash)?;
        KeySpace::Bank.key(bank_id)?;

        let mut user = self.users().get(user_id)?;

        if let Some(owner) = self.index().lookup(hash)? {
            debug!(hash, owner = %owner, "transaction hash already indexed");
            return Err(LedgerError::already_exists(KeySpace::TransactionIndex, hash));
        }

        user.transactions
            .push(Transaction::new(hash, amount, currency, date, bank_id));
        self.users().put(&user)?;

        self.index().put(hash, user_id)?;

        let bank = self.banks().increment_count(bank_id)?;

        info!(
            user = user_id,
            hash,
            bank = bank_id,
            bank_count = bank.transaction_count,
            "transaction created"
        );
        Ok(true)
    }

    /// The user owning the transaction `hash`.
    ///
    /// Both a missing index entry and a dangling one fail with `NotFound`;
    /// they differ only in the entity kind reported.
    pub fn resolve_user_by_transaction(&mut self, hash: &str) -> LedgerResult<User> {
        let user_id = self.index().resolve(hash).inspect_err(|e| {
            debug!(hash, error = %e, "hash not indexed");
        })?;
        self.users().get(&user_id).inspect_err(|e| {
            debug!(hash, user = %user_id, error = %e, "index entry points at missing user");
        })
    }

    /// Every user, ordered by key. Bank and index records are never
    /// included.
    pub fn list_all_users(&mut self) -> LedgerResult<Vec<User>> {
        self.users().list()
    }

    /// Delete a user together with the index entries of its transactions.
    ///
    /// Entries that have since been repointed at another user are left
    /// alone.
    pub fn delete_user(&mut self, id: &str) -> LedgerResult<()> {
        let user = self.users().get(id)?;
        let mut removed = 0usize;
        for tx in &user.transactions {
            if self.index().lookup(&tx.hash)?.as_deref() == Some(id) {
                self.index().remove(&tx.hash)?;
                removed += 1;
            }
        }
        self.users().delete(id)?;
        debug!(user = id, index_entries = removed, "user deleted with index entries");
        Ok(())
    }

    pub fn get_bank(&mut self, id: &str) -> LedgerResult<Bank> {
        self.banks().get(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BankSeed;
    use crate::error::ErrorKind;
    use ubl_store::{InMemoryStateStore, Invocation, StateStore};

    /// Run `f` as one invocation: commit on success, discard on failure.
    fn invoke<T, F>(store: &InMemoryStateStore, config: &LedgerConfig, f: F) -> LedgerResult<T>
    where
        F: FnOnce(&mut Ledger<'_, Invocation<'_>>) -> LedgerResult<T>,
    {
        let mut inv = Invocation::begin(store);
        let result = f(&mut Ledger::new(&mut inv, config));
        match result {
            Ok(value) => {
                store.commit(&inv.into_batch())?;
                Ok(value)
            }
            Err(e) => {
                inv.discard();
                Err(e)
            }
        }
    }

    fn acme() -> LedgerConfig {
        LedgerConfig::with_banks([BankSeed::new("B1", "Acme Bank")])
    }

    fn setup() -> (InMemoryStateStore, LedgerConfig) {
        let store = InMemoryStateStore::new();
        let config = acme();
        invoke(&store, &config, |l| l.initialize_ledger()).unwrap();
        invoke(&store, &config, |l| l.users().create("u1", "John Lee", "john.lee@g.com"))
            .unwrap();
        (store, config)
    }

    fn tx(l: &mut Ledger<'_, Invocation<'_>>, hash: &str, bank: &str) -> LedgerResult<bool> {
        l.create_transaction("u1", hash, "100", "USD", "2024-01-01", bank)
    }

    // -----------------------------------------------------------------------
    // Initialization
    // -----------------------------------------------------------------------

    #[test]
    fn initialize_seeds_configured_banks() {
        let store = InMemoryStateStore::new();
        let config = LedgerConfig::default();
        let seeded = invoke(&store, &config, |l| l.initialize_ledger()).unwrap();
        assert_eq!(seeded.len(), 3);

        let bank = invoke(&store, &config, |l| l.get_bank("B2")).unwrap();
        assert_eq!(bank, Bank::new("B2", "Globex Savings"));
    }

    #[test]
    fn initialize_is_idempotent() {
        let (store, config) = setup();
        invoke(&store, &config, |l| tx(l, "h1", "B1")).unwrap();
        invoke(&store, &config, |l| l.initialize_ledger()).unwrap();

        let bank = invoke(&store, &config, |l| l.get_bank("B1")).unwrap();
        assert_eq!(bank.transaction_count, 1);
    }

    #[test]
    fn initialize_rejects_invalid_config() {
        let store = InMemoryStateStore::new();
        let config = LedgerConfig::with_banks([BankSeed::new("", "Nameless")]);
        let err = invoke(&store, &config, |l| l.initialize_ledger()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert_eq!(store.height().unwrap(), 0);
    }

    // -----------------------------------------------------------------------
    // Transaction creation
    // -----------------------------------------------------------------------

    #[test]
    fn create_transaction_scenario() {
        let (store, config) = setup();
        assert!(invoke(&store, &config, |l| tx(l, "h1", "B1")).unwrap());

        let user = invoke(&store, &config, |l| l.users().get("u1")).unwrap();
        assert_eq!(
            user.transactions,
            vec![Transaction::new("h1", "100", "USD", "2024-01-01", "B1")]
        );
        let owner = invoke(&store, &config, |l| l.resolve_user_by_transaction("h1")).unwrap();
        assert_eq!(owner.id, "u1");
        let bank = invoke(&store, &config, |l| l.get_bank("B1")).unwrap();
        assert_eq!(bank.transaction_count, 1);
    }

    #[test]
    fn transactions_append_in_creation_order() {
        let (store, config) = setup();
        for hash in ["h3", "h1", "h2"] {
            invoke(&store, &config, |l| tx(l, hash, "B1")).unwrap();
        }
        let user = invoke(&store, &config, |l| l.users().get("u1")).unwrap();
        let hashes: Vec<&str> = user.transactions.iter().map(|t| t.hash.as_str()).collect();
        assert_eq!(hashes, vec!["h3", "h1", "h2"]);
    }

    #[test]
    fn separate_invocations_count_twice() {
        let (store, config) = setup();
        invoke(&store, &config, |l| tx(l, "h2", "B1")).unwrap();
        invoke(&store, &config, |l| tx(l, "h1", "B1")).unwrap();
        let bank = invoke(&store, &config, |l| l.get_bank("B1")).unwrap();
        assert_eq!(bank.transaction_count, 2);
    }

    #[test]
    fn unseeded_bank_leaves_nothing_behind() {
        let (store, config) = setup();
        let height = store.height().unwrap();

        let err = invoke(&store, &config, |l| tx(l, "h1", "B9")).unwrap_err();
        assert!(matches!(
            &err,
            LedgerError::NotFound { kind: KeySpace::Bank, key } if key == "B9"
        ));
        assert_eq!(store.height().unwrap(), height);

        let user = invoke(&store, &config, |l| l.users().get("u1")).unwrap();
        assert!(user.transactions.is_empty());
        let err = invoke(&store, &config, |l| l.resolve_user_by_transaction("h1")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn missing_user_fails_not_found() {
        let (store, config) = setup();
        let err = invoke(&store, &config, |l| {
            l.create_transaction("ghost", "h1", "1", "USD", "2024-01-01", "B1")
        })
        .unwrap_err();
        assert!(matches!(err, LedgerError::NotFound { kind: KeySpace::User, .. }));
        let bank = invoke(&store, &config, |l| l.get_bank("B1")).unwrap();
        assert_eq!(bank.transaction_count, 0);
    }

    #[test]
    fn reused_hash_is_rejected() {
        let (store, config) = setup();
        invoke(&store, &config, |l| l.users().create("u2", "Amy Lin", "amy.lin@g.com")).unwrap();
        invoke(&store, &config, |l| tx(l, "h1", "B1")).unwrap();

        let err = invoke(&store, &config, |l| {
            l.create_transaction("u2", "h1", "5", "EUR", "2024-02-01", "B1")
        })
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AlreadyExists);

        let owner = invoke(&store, &config, |l| l.resolve_user_by_transaction("h1")).unwrap();
        assert_eq!(owner.id, "u1");
        let bank = invoke(&store, &config, |l| l.get_bank("B1")).unwrap();
        assert_eq!(bank.transaction_count, 1);
    }

    #[test]
    fn malformed_amount_is_rejected() {
        let (store, config) = setup();
        let err = invoke(&store, &config, |l| {
            l.create_transaction("u1", "h1", "12,50", "USD", "2024-01-01", "B1")
        })
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn amount_is_stored_verbatim() {
        let (store, config) = setup();
        invoke(&store, &config, |l| {
            l.create_transaction("u1", "h1", "100.10", "USD", "2024-01-01", "B1")
        })
        .unwrap();
        let user = invoke(&store, &config, |l| l.users().get("u1")).unwrap();
        assert_eq!(user.transactions[0].amount, "100.10");
    }

    #[test]
    fn concurrent_transactions_on_one_bank_conflict() {
        let (store, config) = setup();
        invoke(&store, &config, |l| l.users().create("u2", "Amy Lin", "a")).unwrap();

        let mut first = Invocation::begin(&store);
        let mut second = Invocation::begin(&store);
        tx(&mut Ledger::new(&mut first, &config), "h1", "B1").unwrap();
        Ledger::new(&mut second, &config)
            .create_transaction("u2", "h2", "1", "USD", "2024-01-01", "B1")
            .unwrap();

        store.commit(&first.into_batch()).unwrap();
        let err = store.commit(&second.into_batch()).unwrap_err();
        assert!(matches!(err, ubl_store::StoreError::Conflict { .. }));

        let bank = invoke(&store, &config, |l| l.get_bank("B1")).unwrap();
        assert_eq!(bank.transaction_count, 1);
    }

    // -----------------------------------------------------------------------
    // Resolution and listing
    // -----------------------------------------------------------------------

    #[test]
    fn resolve_dangling_entry_is_not_found() {
        let (store, config) = setup();
        invoke(&store, &config, |l| l.index().put("h9", "ghost")).unwrap();
        let err = invoke(&store, &config, |l| l.resolve_user_by_transaction("h9")).unwrap_err();
        assert!(matches!(err, LedgerError::NotFound { kind: KeySpace::User, .. }));
    }

    #[test]
    fn list_returns_only_users_in_key_order() {
        let (store, config) = setup();
        invoke(&store, &config, |l| l.users().create("u0", "Amy Lin", "a")).unwrap();
        // Index keys named like users, and banks, must not leak into the list.
        invoke(&store, &config, |l| tx(l, "u2", "B1")).unwrap();
        invoke(&store, &config, |l| tx(l, "zzz", "B1")).unwrap();

        let users = invoke(&store, &config, |l| l.list_all_users()).unwrap();
        let ids: Vec<&str> = users.iter().map(|u| u.id.as_str()).collect();
        assert_eq!(ids, vec!["u0", "u1"]);
    }

    #[test]
    fn list_sees_own_staged_users() {
        let (store, config) = setup();
        let users = invoke(&store, &config, |l| {
            l.users().create("u5", "Staged", "a")?;
            l.list_all_users()
        })
        .unwrap();
        assert_eq!(users.len(), 2);
    }

    #[test]
    fn list_empty_ledger() {
        let store = InMemoryStateStore::new();
        let config = acme();
        invoke(&store, &config, |l| l.initialize_ledger()).unwrap();
        assert!(invoke(&store, &config, |l| l.list_all_users()).unwrap().is_empty());
    }

    // -----------------------------------------------------------------------
    // Deletion
    // -----------------------------------------------------------------------

    #[test]
    fn delete_user_cascades_index_entries() {
        let (store, config) = setup();
        invoke(&store, &config, |l| tx(l, "h1", "B1")).unwrap();
        invoke(&store, &config, |l| tx(l, "h2", "B1")).unwrap();

        invoke(&store, &config, |l| l.delete_user("u1")).unwrap();

        assert!(!invoke(&store, &config, |l| l.users().exists("u1")).unwrap());
        for hash in ["h1", "h2"] {
            let found = invoke(&store, &config, |l| l.index().lookup(hash)).unwrap();
            assert_eq!(found, None);
        }
        // Counters are never decremented.
        let bank = invoke(&store, &config, |l| l.get_bank("B1")).unwrap();
        assert_eq!(bank.transaction_count, 2);
    }

    #[test]
    fn delete_user_keeps_repointed_entries() {
        let (store, config) = setup();
        invoke(&store, &config, |l| tx(l, "h1", "B1")).unwrap();
        invoke(&store, &config, |l| l.index().put("h1", "u2")).unwrap();

        invoke(&store, &config, |l| l.delete_user("u1")).unwrap();
        let found = invoke(&store, &config, |l| l.index().lookup("h1")).unwrap();
        assert_eq!(found.as_deref(), Some("u2"));
    }

    #[test]
    fn delete_missing_user_is_not_found() {
        let (store, config) = setup();
        let err = invoke(&store, &config, |l| l.delete_user("ghost")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }
}
