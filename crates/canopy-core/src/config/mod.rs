//! Engine configuration schemas.
//!
//! All configuration structs are deserialized from TOML files via the
//! `config` crate. Each sub-module represents a logical configuration
//! section, and every section has a `Default` so embedded callers can
//! build a config without touching the filesystem.

pub mod access;
pub mod cache;
pub mod database;
pub mod logging;

use serde::{Deserialize, Serialize};

use self::access::AccessControlConfig;
use self::cache::CacheConfig;
use self::database::{DatabaseConfig, StoreConfig};
use self::logging::LoggingConfig;

use crate::error::AppError;

/// Root engine configuration.
///
/// Top-level deserialization target for the merged TOML configuration
/// files (default.toml + environment overlay + `CANOPY__*` variables).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Global access-control switch.
    #[serde(default)]
    pub access_control: AccessControlConfig,
    /// Result cache settings.
    #[serde(default)]
    pub cache: CacheConfig,
    /// Store backend selection.
    #[serde(default)]
    pub store: StoreConfig,
    /// PostgreSQL connection settings (used by the `postgres` store backend).
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from TOML files.
    ///
    /// Merges the default configuration with an environment-specific overlay
    /// and environment variables prefixed with `CANOPY__`.
    pub fn load(env: &str) -> Result<Self, AppError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("CANOPY")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))
    }
}

fn default_true() -> bool {
    true
}
