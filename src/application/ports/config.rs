//! Configuration port interface

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use crate::domain::config::AppConfig;
use crate::domain::diagnostics::ErrorTable;
use crate::domain::error::ConfigError;

/// Port for configuration storage
#[async_trait]
pub trait ConfigStore: Send + Sync {
    /// Load configuration from storage.
    /// A missing file yields an empty config rather than an error.
    async fn load(&self) -> Result<AppConfig, ConfigError>;

    /// Save configuration to storage.
    async fn save(&self, config: &AppConfig) -> Result<(), ConfigError>;

    /// Get the configuration file path.
    fn path(&self) -> PathBuf;

    /// Check if configuration file exists.
    fn exists(&self) -> bool;

    /// Initialize configuration file with defaults.
    /// Fails if file already exists.
    async fn init(&self) -> Result<(), ConfigError>;

    /// Load an error table override referenced by the `error_table` key.
    /// Relative paths are resolved against the config file's directory.
    async fn load_error_table(&self, path: &Path) -> Result<ErrorTable, ConfigError>;
}
