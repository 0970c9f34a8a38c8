//! Collator configuration.

use serde::{Deserialize, Serialize};

use crate::canonical::canonical_hash_hex;
use crate::DEFAULT_CONFIG_VERSION;

/// Configuration for a collation run.
///
/// There are deliberately few knobs: the collation algorithms themselves are
/// parameter-free, and the same inputs with the same config must always
/// produce the same graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollatorConfig {
    /// Config version identifier.
    pub version: String,
    /// Run the join pass after the last merge, coalescing unbranched
    /// same-sigil node chains for readability.
    pub join_after_merge: bool,
}

impl CollatorConfig {
    /// Config identifier.
    pub fn config_id(&self) -> &str {
        &self.version
    }

    /// Canonical hash of the parameters, for provenance alongside the
    /// graph fingerprint.
    pub fn params_hash(&self) -> String {
        canonical_hash_hex(self)
    }

    /// A config with the join pass disabled, exposing the raw one-node-per-
    /// unmatched-token graph.
    pub fn unjoined() -> Self {
        Self {
            join_after_merge: false,
            ..Self::default()
        }
    }
}

impl Default for CollatorConfig {
    fn default() -> Self {
        Self {
            version: DEFAULT_CONFIG_VERSION.to_string(),
            join_after_merge: true,
        }
    }
}
