use std::path::PathBuf;

use crate::domain::{AppConfig, DomainError};

/// Port for persisting Plume's configuration.
pub trait ConfigStore: Send + Sync {
    /// Load and validate the configuration.
    /// Writes and returns the defaults when nothing is stored yet.
    fn load(&self) -> Result<AppConfig, DomainError>;

    /// Validate and persist the configuration.
    fn save(&self, config: &AppConfig) -> Result<(), DomainError>;

    fn config_path(&self) -> PathBuf;

    fn data_dir(&self) -> PathBuf;

    fn logs_dir(&self) -> PathBuf;
}
