//! # CLI Configuration
//!
//! Optional YAML file passed with `--config`:
//!
//! ```yaml
//! quorum:
//!   authorized_keys:
//!     - "8a88e3dd7409f195fd52db2d3cba5d72ca6709bf1d94121bf3748801b40f6f5c"
//!     - "8139770ea87d175f56a35466c34c7ecccb8d8a91b4ee37a25df60f5b8fc9b394"
//!   threshold: 2
//! replay:
//!   prune_threshold: 4096
//! ```
//!
//! Both sections are optional. Unknown keys are rejected so a typo cannot
//! silently weaken a policy.

use std::path::Path;

use anyhow::{Context, Result};
use escrow_guard::{QuorumPolicy, ReplayGuardConfig};
use serde::{Deserialize, Serialize};

/// Top-level CLI configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CliConfig {
    /// Quorum policy for `escrow quorum`.
    #[serde(default)]
    pub quorum: Option<QuorumPolicy>,
    /// Replay guard tuning for `escrow verify`.
    #[serde(default)]
    pub replay: Option<ReplayGuardConfig>,
}

impl CliConfig {
    /// Load from a YAML file.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        Self::from_yaml(&raw).with_context(|| format!("invalid config file: {}", path.display()))
    }

    /// Parse from YAML text.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Load from `path` if given, else the empty configuration.
    pub fn load_optional(path: Option<&Path>) -> Result<Self> {
        path.map_or_else(|| Ok(Self::default()), Self::load)
    }

    /// The quorum policy, or an error naming the missing section.
    pub fn require_quorum(&self) -> Result<&QuorumPolicy> {
        self.quorum
            .as_ref()
            .context("config has no `quorum` section; pass --config with a quorum policy")
    }
}
