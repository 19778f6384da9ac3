use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::{LedgerError, LedgerResult};

/// A bank provisioned by ledger initialization.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankSeed {
    pub id: String,
    pub name: String,
}

impl BankSeed {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// Configuration for the ledger orchestrator.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Banks written by `InitializeLedger`, in order.
    pub banks: Vec<BankSeed>,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            banks: vec![
                BankSeed::new("B1", "Acme Bank"),
                BankSeed::new("B2", "Globex Savings"),
                BankSeed::new("B3", "Initech Credit Union"),
            ],
        }
    }
}

impl LedgerConfig {
    /// A configuration seeding exactly `banks`.
    pub fn with_banks<I>(banks: I) -> Self
    where
        I: IntoIterator<Item = BankSeed>,
    {
        Self {
            banks: banks.into_iter().collect(),
        }
    }

    /// Bank ids must be non-empty and unique.
    pub fn validate(&self) -> LedgerResult<()> {
        let mut seen = HashSet::new();
        for bank in &self.banks {
            if bank.id.is_empty() {
                return Err(LedgerError::InvalidArgument(
                    "bank seed with empty id".to_string(),
                ));
            }
            if !seen.insert(bank.id.as_str()) {
                return Err(LedgerError::InvalidArgument(format!(
                    "duplicate bank seed id: {}",
                    bank.id
                )));
            }
        }
        Ok(())
    }
}
