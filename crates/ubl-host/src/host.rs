//! The invocation host.
//!
//! Every call runs in its own [`Invocation`]. The write-set is committed
//! only when the ledger call returns `Ok`; any error discards it, so a
//! failed call leaves no trace in the store.

use std::sync::Arc;

use serde_json::Value;
use tracing::{info, info_span, warn};
use ubl_ledger::{Ledger, LedgerConfig};
use ubl_store::{
    CommitReceipt, DurableStateStore, InMemoryStateStore, Invocation, InvocationId, StateStore,
    Stub,
};

use crate::config::HostConfig;
use crate::error::HostResult;
use crate::operation::Operation;
use crate::response::Response;

/// Outcome of a committed invocation.
#[derive(Clone, Debug, PartialEq)]
pub struct Executed {
    pub invocation: InvocationId,
    pub payload: Value,
    pub receipt: CommitReceipt,
}

/// Runs named operations against a state store.
pub struct Host {
    store: Arc<dyn StateStore>,
    config: LedgerConfig,
}

impl Host {
    pub fn new(store: Arc<dyn StateStore>, config: LedgerConfig) -> Self {
        Self { store, config }
    }

    /// A host over a fresh in-memory store.
    pub fn in_memory(config: LedgerConfig) -> Self {
        Self::new(Arc::new(InMemoryStateStore::new()), config)
    }

    /// Open the store described by `config`: durable when `state_dir` is
    /// set, in-memory otherwise.
    pub fn open(config: &HostConfig) -> HostResult<Self> {
        config.ledger.validate()?;
        let store: Arc<dyn StateStore> = match &config.state_dir {
            Some(dir) => Arc::new(DurableStateStore::open(dir, config.sync_mode)?),
            None => Arc::new(InMemoryStateStore::new()),
        };
        Ok(Self::new(store, config.ledger.clone()))
    }

    pub fn store(&self) -> &Arc<dyn StateStore> {
        &self.store
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    /// Invoke `function` with positional `args` and wrap the outcome.
    pub fn invoke<A: AsRef<str>>(&self, function: &str, args: &[A]) -> Response {
        let invocation = InvocationId::new();
        let span = info_span!("invoke", %invocation, function);
        let _enter = span.enter();

        match Operation::parse(function, args).and_then(|op| self.execute_as(invocation, op)) {
            Ok(done) => Response::success(done.invocation, done.payload),
            Err(e) => Response::failure(invocation, &e),
        }
    }

    /// Run an already-parsed operation under a fresh invocation id.
    pub fn execute(&self, op: Operation) -> HostResult<Executed> {
        self.execute_as(InvocationId::new(), op)
    }

    fn execute_as(&self, id: InvocationId, op: Operation) -> HostResult<Executed> {
        let name = op.name();
        let mut inv = Invocation::with_id(self.store.as_ref(), id);

        let outcome = {
            let mut ledger = Ledger::new(&mut inv, &self.config);
            dispatch(&mut ledger, op)
        };

        let payload = match outcome {
            Ok(payload) => payload,
            Err(e) => {
                warn!(operation = name, error = %e, "invocation failed; discarding writes");
                inv.discard();
                return Err(e);
            }
        };

        let receipt = self.store.commit(&inv.into_batch()).inspect_err(|e| {
            warn!(operation = name, error = %e, "commit rejected");
        })?;
        info!(
            operation = name,
            height = receipt.height,
            writes = receipt.writes,
            "invocation committed"
        );
        Ok(Executed {
            invocation: id,
            payload,
            receipt,
        })
    }
}

impl std::fmt::Debug for Host {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Host")
            .field("banks", &self.config.banks.len())
            .finish()
    }
}

fn dispatch<S: Stub + ?Sized>(ledger: &mut Ledger<'_, S>, op: Operation) -> HostResult<Value> {
    let payload = match op {
        Operation::InitializeLedger => {
            ledger.initialize_ledger()?;
            Value::Null
        }
        Operation::UserExists { id } => Value::Bool(ledger.users().exists(&id)?),
        Operation::CreateUser { id, name, address } => {
            ledger.users().create(&id, &name, &address)?;
            Value::Null
        }
        Operation::GetUser { id } => serde_json::to_value(ledger.users().get(&id)?)?,
        Operation::UpdateUser { id, name, address } => {
            ledger.users().update(&id, &name, &address)?;
            Value::Null
        }
        Operation::DeleteUser { id } => {
            ledger.delete_user(&id)?;
            Value::Null
        }
        Operation::ListAllUsers => serde_json::to_value(ledger.list_all_users()?)?,
        Operation::CreateTransaction {
            user_id,
            hash,
            amount,
            currency,
            date,
            bank_id,
        } => Value::Bool(
            ledger.create_transaction(&user_id, &hash, &amount, &currency, &date, &bank_id)?,
        ),
        Operation::ResolveUserByTransaction { hash } => {
            serde_json::to_value(ledger.resolve_user_by_transaction(&hash)?)?
        }
        Operation::GetBankById { bank_id } => serde_json::to_value(ledger.get_bank(&bank_id)?)?,
    };
    Ok(payload)
}
