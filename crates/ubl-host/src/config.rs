use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use ubl_ledger::LedgerConfig;
use ubl_store::SyncMode;

use crate::error::{HostError, HostResult};

/// Host configuration, usually loaded from a TOML file.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    /// Directory holding the commit log. State is in-memory when unset.
    pub state_dir: Option<PathBuf>,
    /// When the commit log is flushed to disk.
    pub sync_mode: SyncMode,
    pub ledger: LedgerConfig,
}

impl HostConfig {
    pub fn from_toml_str(s: &str) -> HostResult<Self> {
        let config: Self = toml::from_str(s).map_err(|e| HostError::Config(e.to_string()))?;
        config.ledger.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> HostResult<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| HostError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }
}
