//! Access-control configuration.

use serde::{Deserialize, Serialize};

/// Global access-control policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessControlConfig {
    /// When `false`, every permission check passes. Intended for
    /// bootstrapping and administrative contexts only.
    #[serde(default = "super::default_true")]
    pub enabled: bool,
}

impl Default for AccessControlConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}
