//! Application configuration schemas.
//!
//! All configuration structs are deserialized from TOML files via the
//! `config` crate, overlaid with `OSW_`-prefixed environment variables.
//! Each sub-module represents a logical configuration section.

pub mod bus;
pub mod converter;
pub mod logging;
pub mod server;
pub mod storage;
pub mod worker;

use serde::{Deserialize, Serialize};
use validator::Validate;

pub use self::bus::{BusConfig, BusProvider};
pub use self::converter::ConverterConfig;
pub use self::logging::LoggingConfig;
pub use self::server::ServerConfig;
pub use self::storage::StorageConfig;
pub use self::worker::WorkerConfig;

use crate::error::AppError;

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct AppConfig {
    /// Health endpoint settings.
    #[serde(default)]
    pub server: ServerConfig,
    /// Message bus settings.
    #[validate(nested)]
    #[serde(default)]
    pub bus: BusConfig,
    /// Object storage settings.
    #[validate(nested)]
    #[serde(default)]
    pub storage: StorageConfig,
    /// Job execution settings.
    #[validate(nested)]
    #[serde(default)]
    pub worker: WorkerConfig,
    /// Converter settings.
    #[validate(nested)]
    #[serde(default)]
    pub converter: ConverterConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration.
    ///
    /// Merges `config/default.toml` (or `path` when given) with
    /// `config/{env}.toml` and environment variables such as
    /// `OSW_BUS__LISTENING_TOPIC`, then validates the result.
    pub fn load(path: Option<&str>, env: &str) -> Result<Self, AppError> {
        let base = path.unwrap_or("config/default");
        let config = config::Config::builder()
            .add_source(config::File::with_name(base).required(path.is_some()))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("OSW")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        let config: Self = config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))?;

        config.check()?;
        Ok(config)
    }

    /// Validate every section, flattening validator output into one error.
    pub fn check(&self) -> Result<(), AppError> {
        self.validate()
            .map_err(|e| AppError::configuration(format!("Invalid configuration: {e}")))
    }
}
