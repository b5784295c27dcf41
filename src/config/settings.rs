use crate::storage::StorageType;
use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub storage_type: StorageType,
    pub api_base_url: String,
    pub local_db_path: PathBuf,
    /// JSON fixture seeding the `apiMock` backend
    pub mock_fixture: Option<PathBuf>,
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let config_env = env::var("CONFIG_ENV").unwrap_or_else(|_| "default".to_string());
        Self::load(&format!("config/{}", config_env))
    }

    /// Defaults, then the optional file at `path`, then `APP__*` variables
    pub fn load(path: &str) -> Result<Self, ConfigError> {
        let config = Config::builder()
            .set_default("storage.storage_type", "browserStorage")?
            .set_default("storage.api_base_url", "http://localhost:3000")?
            .set_default("storage.local_db_path", "./data/dialstore.sqlite")?
            .set_default("storage.request_timeout_secs", 30)?
            .set_default("logging.level", "info")?
            .add_source(File::with_name(path).required(false))
            .add_source(Environment::with_prefix("APP").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}
